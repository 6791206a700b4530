use std::collections::HashMap;

use crate::{err_at, Result};

/// Supported field types. The numeric codes are what `field_catalog`
/// stores on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Varchar,
}

impl FieldType {
    pub fn to_code(&self) -> i32 {
        match self {
            FieldType::Integer => 0,
            FieldType::Varchar => 1,
        }
    }

    pub fn from_code(code: i32) -> Result<FieldType> {
        match code {
            0 => Ok(FieldType::Integer),
            1 => Ok(FieldType::Varchar),
            _ => err_at!(FailConvert, msg: "bad field type code {}", code),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct FieldInfo {
    ftype: FieldType,
    length: usize,
}

/// Record schema: an ordered list of named fields. Ordering is stable
/// and defines the physical offset assignment within a slot. Varchar
/// lengths are maximum byte counts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    fields: Vec<String>,
    info: HashMap<String, FieldInfo>,
}

impl Schema {
    pub fn new() -> Schema {
        Schema::default()
    }

    pub fn add_field(&mut self, name: &str, ftype: FieldType, length: usize) {
        self.fields.push(name.to_string());
        self.info.insert(name.to_string(), FieldInfo { ftype, length });
    }

    pub fn add_int_field(&mut self, name: &str) {
        self.add_field(name, FieldType::Integer, 0)
    }

    pub fn add_string_field(&mut self, name: &str, length: usize) {
        self.add_field(name, FieldType::Varchar, length)
    }

    /// Copy field `name` from `other` into this schema.
    pub fn add(&mut self, name: &str, other: &Schema) -> Result<()> {
        let ftype = other.field_type(name)?;
        let length = other.length(name)?;
        self.add_field(name, ftype, length);
        Ok(())
    }

    /// Copy every field of `other` into this schema.
    pub fn add_all(&mut self, other: &Schema) -> Result<()> {
        for name in other.fields() {
            self.add(name, other)?;
        }
        Ok(())
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.info.contains_key(name)
    }

    pub fn field_type(&self, name: &str) -> Result<FieldType> {
        match self.info.get(name) {
            Some(info) => Ok(info.ftype),
            None => err_at!(KeyNotFound, msg: "field {}", name),
        }
    }

    pub fn length(&self, name: &str) -> Result<usize> {
        match self.info.get(name) {
            Some(info) => Ok(info.length),
            None => err_at!(KeyNotFound, msg: "field {}", name),
        }
    }
}

/// Physical layout of a record slot derived from a [Schema]: byte
/// offset of every field and the total slot size. A slot starts with
/// the 4 byte in-use flag; an int field takes 4 bytes, a varchar field
/// takes 4 plus its maximum byte length.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    schema: Schema,
    offsets: HashMap<String, usize>,
    slot_size: usize,
}

impl Layout {
    pub fn new(schema: Schema) -> Result<Layout> {
        let mut offsets = HashMap::new();
        let mut pos = 4; // the empty/in-use flag
        for name in schema.fields() {
            offsets.insert(name.to_string(), pos);
            pos += Self::length_in_bytes(&schema, name)?;
        }
        Ok(Layout {
            schema,
            offsets,
            slot_size: pos,
        })
    }

    /// Reassemble a layout from catalog data.
    pub fn from_parts(
        schema: Schema,
        offsets: HashMap<String, usize>,
        slot_size: usize,
    ) -> Layout {
        Layout {
            schema,
            offsets,
            slot_size,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn offset(&self, name: &str) -> Result<usize> {
        match self.offsets.get(name) {
            Some(offset) => Ok(*offset),
            None => err_at!(KeyNotFound, msg: "field {}", name),
        }
    }

    #[inline]
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    fn length_in_bytes(schema: &Schema, name: &str) -> Result<usize> {
        let n = match schema.field_type(name)? {
            FieldType::Integer => 4,
            FieldType::Varchar => 4 + schema.length(name)?,
        };
        Ok(n)
    }
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod schema_test;
