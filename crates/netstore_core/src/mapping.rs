//! Declarative column tables binding attribute objects to table rows.
//!
//! Every equipment family exposes one [`TableMapping`], built once behind a
//! `Lazy` static and shared read-only afterwards. The storage layer only ever
//! talks to attributes through these tables.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::attributes::*;
use crate::{
    IdentifiableAttributes, NetstoreError, NetstoreResult, ResourceType, Value, ValueType,
};

type Getter<T> = Box<dyn Fn(&T) -> NetstoreResult<Value> + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, Value) -> NetstoreResult<()> + Send + Sync>;

pub struct ColumnMapping<T> {
    name: String,
    value_type: ValueType,
    getter: Getter<T>,
    setter: Setter<T>,
}

impl<T> ColumnMapping<T> {
    pub fn new(
        name: impl Into<String>,
        value_type: ValueType,
        getter: impl Fn(&T) -> Value + Send + Sync + 'static,
        setter: impl Fn(&mut T, Value) -> NetstoreResult<()> + Send + Sync + 'static,
    ) -> Self {
        Self::fallible(name, value_type, move |attrs| Ok(getter(attrs)), setter)
    }

    /// Column whose getter can fail, such as a JSON encoding.
    pub fn fallible(
        name: impl Into<String>,
        value_type: ValueType,
        getter: impl Fn(&T) -> NetstoreResult<Value> + Send + Sync + 'static,
        setter: impl Fn(&mut T, Value) -> NetstoreResult<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            value_type,
            getter: Box::new(getter),
            setter: Box::new(setter),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn get(&self, attributes: &T) -> NetstoreResult<Value> {
        (self.getter)(attributes)
            .map_err(|err| NetstoreError::storage(format!("column {}: {err}", self.name)))
    }

    pub fn set(&self, attributes: &mut T, value: Value) -> NetstoreResult<()> {
        (self.setter)(attributes, value)
            .map_err(|err| NetstoreError::storage(format!("column {}: {err}", self.name)))
    }
}

/// Column table of one equipment family.
pub struct TableMapping<T> {
    table: &'static str,
    resource_type: ResourceType,
    container_columns: Vec<&'static str>,
    columns: Vec<ColumnMapping<T>>,
    index: HashMap<String, usize>,
}

impl<T: Default + 'static> TableMapping<T> {
    pub fn builder(table: &'static str, resource_type: ResourceType) -> TableMappingBuilder<T> {
        TableMappingBuilder {
            table,
            resource_type,
            container_columns: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Columns holding the id of a containing equipment (substation, voltage level).
    pub fn container_columns(&self) -> &[&'static str] {
        &self.container_columns
    }

    pub fn columns(&self) -> &[ColumnMapping<T>] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(ColumnMapping::name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMapping<T>> {
        self.index.get(name).map(|idx| &self.columns[*idx])
    }

    pub fn read(&self, attributes: &T, column: &str) -> NetstoreResult<Value> {
        self.column(column)
            .ok_or_else(|| self.unknown_column(column))?
            .get(attributes)
    }

    pub fn write(&self, attributes: &mut T, column: &str, value: Value) -> NetstoreResult<()> {
        let mapping = self
            .column(column)
            .ok_or_else(|| self.unknown_column(column))?;
        mapping.set(attributes, value)
    }

    pub fn new_attributes(&self) -> T {
        T::default()
    }

    pub fn descriptor(&self) -> TableDescriptor {
        TableDescriptor {
            table: self.table,
            resource_type: self.resource_type,
            container_columns: self.container_columns.clone(),
            columns: self
                .columns
                .iter()
                .map(|column| (column.name.clone(), column.value_type))
                .collect(),
        }
    }

    fn unknown_column(&self, column: &str) -> NetstoreError {
        NetstoreError::not_found(format!("column {column} in table {}", self.table))
    }
}

pub struct TableMappingBuilder<T> {
    table: &'static str,
    resource_type: ResourceType,
    container_columns: Vec<&'static str>,
    columns: Vec<ColumnMapping<T>>,
}

impl<T: 'static> TableMappingBuilder<T> {
    pub fn container(mut self, column: &'static str) -> Self {
        self.container_columns.push(column);
        self
    }

    pub fn column(mut self, column: ColumnMapping<T>) -> Self {
        self.columns.push(column);
        self
    }

    /// Doubles map NaN to SQL NULL and back.
    pub fn f64(
        self,
        name: impl Into<String>,
        get: impl Fn(&T) -> f64 + Send + Sync + 'static,
        set: impl Fn(&mut T, f64) + Send + Sync + 'static,
    ) -> Self {
        self.column(ColumnMapping::<T>::new(
            name,
            ValueType::F64,
            move |attrs| f64_value(get(attrs)),
            move |attrs, value| {
                set(attrs, to_f64(value)?.unwrap_or(f64::NAN));
                Ok(())
            },
        ))
    }

    pub fn opt_f64(
        self,
        name: impl Into<String>,
        get: impl Fn(&T) -> Option<f64> + Send + Sync + 'static,
        set: impl Fn(&mut T, Option<f64>) + Send + Sync + 'static,
    ) -> Self {
        self.column(ColumnMapping::<T>::new(
            name,
            ValueType::F64,
            move |attrs| Value::from(get(attrs)),
            move |attrs, value| {
                set(attrs, to_f64(value)?);
                Ok(())
            },
        ))
    }

    pub fn i32(
        self,
        name: impl Into<String>,
        get: impl Fn(&T) -> i32 + Send + Sync + 'static,
        set: impl Fn(&mut T, i32) + Send + Sync + 'static,
    ) -> Self {
        self.column(ColumnMapping::<T>::new(
            name,
            ValueType::I64,
            move |attrs| Value::from(get(attrs)),
            move |attrs, value| {
                if let Some(value) = to_i32(value)? {
                    set(attrs, value);
                }
                Ok(())
            },
        ))
    }

    pub fn opt_i32(
        self,
        name: impl Into<String>,
        get: impl Fn(&T) -> Option<i32> + Send + Sync + 'static,
        set: impl Fn(&mut T, Option<i32>) + Send + Sync + 'static,
    ) -> Self {
        self.column(ColumnMapping::<T>::new(
            name,
            ValueType::I64,
            move |attrs| Value::from(get(attrs)),
            move |attrs, value| {
                set(attrs, to_i32(value)?);
                Ok(())
            },
        ))
    }

    pub fn bool(
        self,
        name: impl Into<String>,
        get: impl Fn(&T) -> bool + Send + Sync + 'static,
        set: impl Fn(&mut T, bool) + Send + Sync + 'static,
    ) -> Self {
        self.column(ColumnMapping::<T>::new(
            name,
            ValueType::Bool,
            move |attrs| Value::from(get(attrs)),
            move |attrs, value| {
                set(attrs, to_bool(value)?.unwrap_or(false));
                Ok(())
            },
        ))
    }

    pub fn str(
        self,
        name: impl Into<String>,
        get: impl Fn(&T) -> &str + Send + Sync + 'static,
        set: impl Fn(&mut T, String) + Send + Sync + 'static,
    ) -> Self {
        self.column(ColumnMapping::<T>::new(
            name,
            ValueType::Str,
            move |attrs| Value::from(get(attrs)),
            move |attrs, value| {
                set(attrs, to_string(value)?.unwrap_or_default());
                Ok(())
            },
        ))
    }

    pub fn opt_str(
        self,
        name: impl Into<String>,
        get: impl Fn(&T) -> Option<&str> + Send + Sync + 'static,
        set: impl Fn(&mut T, Option<String>) + Send + Sync + 'static,
    ) -> Self {
        self.column(ColumnMapping::<T>::new(
            name,
            ValueType::Str,
            move |attrs| Value::from(get(attrs).map(str::to_string)),
            move |attrs, value| {
                set(attrs, to_string(value)?);
                Ok(())
            },
        ))
    }

    /// Structured sub-object stored as JSON text; NULL decodes to the default.
    pub fn json<V>(
        self,
        name: impl Into<String>,
        get: impl Fn(&T) -> &V + Send + Sync + 'static,
        set: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> Self
    where
        V: Serialize + DeserializeOwned + Default + 'static,
    {
        self.column(ColumnMapping::<T>::fallible(
            name,
            ValueType::Json,
            move |attrs| Value::json(get(attrs)),
            move |attrs, value| {
                set(attrs, value.decode_json::<V>()?.unwrap_or_default());
                Ok(())
            },
        ))
    }

    pub fn build(self) -> TableMapping<T> {
        let index = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| (column.name.clone(), idx))
            .collect();
        TableMapping {
            table: self.table,
            resource_type: self.resource_type,
            container_columns: self.container_columns,
            columns: self.columns,
            index,
        }
    }
}

pub(crate) fn f64_value(value: f64) -> Value {
    if value.is_nan() {
        Value::Null
    } else {
        Value::F64(value)
    }
}

pub(crate) fn to_f64(value: Value) -> NetstoreResult<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        other => other
            .as_f64()
            .map(Some)
            .ok_or_else(|| mismatch(ValueType::F64, &other)),
    }
}

pub(crate) fn to_i32(value: Value) -> NetstoreResult<Option<i32>> {
    match value {
        Value::Null => Ok(None),
        other => other
            .as_i32()
            .map(Some)
            .ok_or_else(|| mismatch(ValueType::I64, &other)),
    }
}

pub(crate) fn to_bool(value: Value) -> NetstoreResult<Option<bool>> {
    match value {
        Value::Null => Ok(None),
        other => other
            .as_bool()
            .map(Some)
            .ok_or_else(|| mismatch(ValueType::Bool, &other)),
    }
}

pub(crate) fn to_string(value: Value) -> NetstoreResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::Str(value) => Ok(Some(value)),
        other => Err(mismatch(ValueType::Str, &other)),
    }
}

fn mismatch(expected: ValueType, got: &Value) -> NetstoreError {
    NetstoreError::storage(format!("expected {expected:?} value, got {got:?}"))
}

/// Type-erased view of a [`TableMapping`], enough to create and clone tables.
#[derive(Clone, Debug, PartialEq)]
pub struct TableDescriptor {
    pub table: &'static str,
    pub resource_type: ResourceType,
    pub container_columns: Vec<&'static str>,
    pub columns: Vec<(String, ValueType)>,
}

static DESCRIPTORS: Lazy<Vec<TableDescriptor>> = Lazy::new(|| {
    vec![
        SubstationAttributes::mapping().descriptor(),
        VoltageLevelAttributes::mapping().descriptor(),
        GeneratorAttributes::mapping().descriptor(),
        BatteryAttributes::mapping().descriptor(),
        LoadAttributes::mapping().descriptor(),
        ShuntCompensatorAttributes::mapping().descriptor(),
        StaticVarCompensatorAttributes::mapping().descriptor(),
        VscConverterStationAttributes::mapping().descriptor(),
        LccConverterStationAttributes::mapping().descriptor(),
        BusbarSectionAttributes::mapping().descriptor(),
        SwitchAttributes::mapping().descriptor(),
        LineAttributes::mapping().descriptor(),
        TwoWindingsTransformerAttributes::mapping().descriptor(),
        ThreeWindingsTransformerAttributes::mapping().descriptor(),
        DanglingLineAttributes::mapping().descriptor(),
        HvdcLineAttributes::mapping().descriptor(),
        TieLineAttributes::mapping().descriptor(),
        GroundAttributes::mapping().descriptor(),
        AreaAttributes::mapping().descriptor(),
    ]
});

/// Descriptors of every equipment table, in [`ResourceType::EQUIPMENT`] order.
pub fn descriptors() -> &'static [TableDescriptor] {
    &DESCRIPTORS
}

pub fn descriptor_for(resource_type: ResourceType) -> NetstoreResult<&'static TableDescriptor> {
    DESCRIPTORS
        .iter()
        .find(|descriptor| descriptor.resource_type == resource_type)
        .ok_or_else(|| NetstoreError::not_found(format!("mapping for {resource_type}")))
}

pub fn descriptor_for_table(table: &str) -> NetstoreResult<&'static TableDescriptor> {
    DESCRIPTORS
        .iter()
        .find(|descriptor| descriptor.table == table)
        .ok_or_else(|| NetstoreError::not_found(format!("mapping for table {table}")))
}

/// Columns shared by every identifiable.
macro_rules! identifiable_columns {
    ($builder:expr) => {
        $builder
            .opt_str("name", |a| a.name.as_deref(), |a, v| a.name = v)
            .bool("fictitious", |a| a.fictitious, |a, v| a.fictitious = v)
            .json("properties", |a| &a.properties, |a, v| a.properties = v)
            .json("aliases", |a| &a.aliases, |a, v| a.aliases = v)
    };
}

/// Single-terminal connection columns; `voltage_level_id` is the container.
macro_rules! injection_columns {
    ($builder:expr) => {
        $builder
            .container("voltage_level_id")
            .str(
                "voltage_level_id",
                |a| a.voltage_level_id.as_str(),
                |a, v| a.voltage_level_id = v,
            )
            .opt_i32("node", |a| a.node, |a, v| a.node = v)
            .opt_str("bus", |a| a.bus.as_deref(), |a, v| a.bus = v)
            .opt_str(
                "connectable_bus",
                |a| a.connectable_bus.as_deref(),
                |a, v| a.connectable_bus = v,
            )
            .f64("p", |a| a.p, |a, v| a.p = v)
            .f64("q", |a| a.q, |a, v| a.q = v)
    };
}

/// Two-terminal connection columns with `voltage_level_id1/2` containers.
macro_rules! branch_columns {
    ($builder:expr) => {
        $builder
            .container("voltage_level_id1")
            .container("voltage_level_id2")
            .str(
                "voltage_level_id1",
                |a| a.voltage_level_id1.as_str(),
                |a, v| a.voltage_level_id1 = v,
            )
            .str(
                "voltage_level_id2",
                |a| a.voltage_level_id2.as_str(),
                |a, v| a.voltage_level_id2 = v,
            )
            .opt_i32("node1", |a| a.node1, |a, v| a.node1 = v)
            .opt_i32("node2", |a| a.node2, |a, v| a.node2 = v)
            .opt_str("bus1", |a| a.bus1.as_deref(), |a, v| a.bus1 = v)
            .opt_str("bus2", |a| a.bus2.as_deref(), |a, v| a.bus2 = v)
            .opt_str(
                "connectable_bus1",
                |a| a.connectable_bus1.as_deref(),
                |a, v| a.connectable_bus1 = v,
            )
            .opt_str(
                "connectable_bus2",
                |a| a.connectable_bus2.as_deref(),
                |a, v| a.connectable_bus2 = v,
            )
            .f64("p1", |a| a.p1, |a, v| a.p1 = v)
            .f64("q1", |a| a.q1, |a, v| a.q1 = v)
            .f64("p2", |a| a.p2, |a, v| a.p2 = v)
            .f64("q2", |a| a.q2, |a, v| a.q2 = v)
            .opt_str(
                "selected_operational_limits_group_id1",
                |a| a.selected_operational_limits_group_id1.as_deref(),
                |a, v| a.selected_operational_limits_group_id1 = v,
            )
            .opt_str(
                "selected_operational_limits_group_id2",
                |a| a.selected_operational_limits_group_id2.as_deref(),
                |a, v| a.selected_operational_limits_group_id2 = v,
            )
    };
}

pub(crate) use {branch_columns, identifiable_columns, injection_columns};

#[cfg(test)]
mod tests {
    use super::{descriptor_for, descriptor_for_table, descriptors};
    use crate::{
        GeneratorAttributes, IdentifiableAttributes, NetstoreError, ResourceType, Value,
        ValueType,
    };

    #[test]
    fn registry_covers_every_family_once() {
        let tables = descriptors();
        assert_eq!(tables.len(), ResourceType::EQUIPMENT.len());
        for (descriptor, resource_type) in tables.iter().zip(ResourceType::EQUIPMENT) {
            assert_eq!(descriptor.resource_type, resource_type);
            assert_eq!(
                descriptor_for_table(descriptor.table)
                    .expect("lookup")
                    .resource_type,
                resource_type
            );
        }
    }

    #[test]
    fn unknown_table_is_not_found() {
        assert!(matches!(
            descriptor_for_table("busbar"),
            Err(NetstoreError::NotFound { .. })
        ));
        assert!(matches!(
            descriptor_for(ResourceType::Network),
            Err(NetstoreError::NotFound { .. })
        ));
    }

    #[test]
    fn column_names_are_unique_and_ordered() {
        for descriptor in descriptors() {
            let mut names: Vec<&str> = descriptor
                .columns
                .iter()
                .map(|(name, _)| name.as_str())
                .collect();
            let total = names.len();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), total, "duplicate column in {}", descriptor.table);
        }
        let generator = GeneratorAttributes::mapping();
        assert_eq!(generator.column_names()[0], "name");
        assert_eq!(
            generator.column("min_q").map(|c| c.value_type()),
            Some(ValueType::F64)
        );
    }

    #[test]
    fn read_write_roundtrip_through_columns() {
        let mapping = GeneratorAttributes::mapping();
        let mut attributes = mapping.new_attributes();
        mapping
            .write(&mut attributes, "target_p", Value::F64(120.0))
            .expect("write");
        mapping
            .write(&mut attributes, "voltage_level_id", Value::from("VL1"))
            .expect("write");
        assert_eq!(attributes.target_p, 120.0);
        assert_eq!(
            mapping.read(&attributes, "voltage_level_id").expect("read"),
            Value::from("VL1")
        );
    }

    #[test]
    fn nan_doubles_are_stored_as_null() {
        let mapping = GeneratorAttributes::mapping();
        let mut attributes = mapping.new_attributes();
        mapping
            .write(&mut attributes, "p", Value::Null)
            .expect("write");
        assert!(attributes.p.is_nan());
        assert_eq!(mapping.read(&attributes, "p").expect("read"), Value::Null);
    }

    #[test]
    fn unknown_column_is_not_found() {
        let mapping = GeneratorAttributes::mapping();
        let mut attributes = mapping.new_attributes();
        assert!(matches!(
            mapping.write(&mut attributes, "rho", Value::F64(1.0)),
            Err(NetstoreError::NotFound { .. })
        ));
    }

    #[test]
    fn type_mismatch_is_a_storage_error() {
        let mapping = GeneratorAttributes::mapping();
        let mut attributes = mapping.new_attributes();
        assert!(matches!(
            mapping.write(&mut attributes, "target_p", Value::from("high")),
            Err(NetstoreError::Storage { .. })
        ));
    }
}
