//! In-memory [`BookMessage`] implementation.

use super::{BookMessage, Fid, FieldRef, FieldView};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Field {
    Char(char),
    I64(i64),
    U64(u64),
    F64(f64),
    Price(Decimal),
    Str(String),
    Msg(Box<MemoryMessage>),
    Vector(Vec<MemoryMessage>),
}

/// A message holding its fields in insertion order.
///
/// Lookups are linear, which beats hashing at the field counts a book message
/// carries. Serializable so published messages can be logged or persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMessage {
    fields: Vec<(Fid, Field)>,
}

impl MemoryMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field ids in insertion order.
    pub fn fids(&self) -> impl Iterator<Item = Fid> + '_ {
        self.fields.iter().map(|(fid, _)| *fid)
    }

    fn find(&self, fid: Fid) -> Option<&Field> {
        self.fields
            .iter()
            .find(|(id, _)| *id == fid)
            .map(|(_, field)| field)
    }

    fn slot(&mut self, fid: Fid) -> Option<&mut Field> {
        self.fields
            .iter_mut()
            .find(|(id, _)| *id == fid)
            .map(|(_, field)| field)
    }

    fn put(&mut self, fid: Fid, field: Field) {
        match self.slot(fid) {
            Some(existing) => *existing = field,
            None => self.fields.push((fid, field)),
        }
    }
}

impl BookMessage for MemoryMessage {
    fn clear(&mut self) {
        self.fields.clear();
    }

    fn num_fields(&self) -> usize {
        self.fields.len()
    }

    fn has_field(&self, fid: Fid) -> bool {
        self.find(fid).is_some()
    }

    fn set_char(&mut self, fid: Fid, value: char) {
        self.put(fid, Field::Char(value));
    }

    fn set_i64(&mut self, fid: Fid, value: i64) {
        self.put(fid, Field::I64(value));
    }

    fn set_u64(&mut self, fid: Fid, value: u64) {
        self.put(fid, Field::U64(value));
    }

    fn set_f64(&mut self, fid: Fid, value: f64) {
        self.put(fid, Field::F64(value));
    }

    fn set_price(&mut self, fid: Fid, value: Decimal) {
        self.put(fid, Field::Price(value));
    }

    fn set_str(&mut self, fid: Fid, value: &str) {
        if let Some(Field::Str(existing)) = self.slot(fid) {
            existing.clear();
            existing.push_str(value);
            return;
        }
        self.put(fid, Field::Str(value.to_string()));
    }

    fn set_msg(&mut self, fid: Fid, value: &Self) {
        if let Some(Field::Msg(existing)) = self.slot(fid) {
            (**existing).clone_from(value);
            return;
        }
        self.put(fid, Field::Msg(Box::new(value.clone())));
    }

    fn set_msg_vector(&mut self, fid: Fid, values: &[Self]) {
        if let Some(Field::Vector(existing)) = self.slot(fid) {
            existing.clone_from_slice_resize(values);
            return;
        }
        self.put(fid, Field::Vector(values.to_vec()));
    }

    fn get_char(&self, fid: Fid) -> Option<char> {
        match self.find(fid)? {
            Field::Char(value) => Some(*value),
            Field::I64(value) => u8::try_from(*value).ok().map(char::from),
            Field::U64(value) => u8::try_from(*value).ok().map(char::from),
            _ => None,
        }
    }

    fn get_i64(&self, fid: Fid) -> Option<i64> {
        match self.find(fid)? {
            Field::I64(value) => Some(*value),
            Field::U64(value) => i64::try_from(*value).ok(),
            _ => None,
        }
    }

    fn get_u64(&self, fid: Fid) -> Option<u64> {
        match self.find(fid)? {
            Field::U64(value) => Some(*value),
            Field::I64(value) => u64::try_from(*value).ok(),
            _ => None,
        }
    }

    fn get_f64(&self, fid: Fid) -> Option<f64> {
        match self.find(fid)? {
            Field::F64(value) => Some(*value),
            Field::I64(value) => Some(*value as f64),
            Field::U64(value) => Some(*value as f64),
            _ => None,
        }
    }

    fn get_price(&self, fid: Fid) -> Option<Decimal> {
        match self.find(fid)? {
            Field::Price(value) => Some(*value),
            Field::I64(value) => Some(Decimal::from(*value)),
            Field::U64(value) => Some(Decimal::from(*value)),
            Field::F64(value) => Decimal::try_from(*value).ok(),
            _ => None,
        }
    }

    fn get_str(&self, fid: Fid) -> Option<&str> {
        match self.find(fid)? {
            Field::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    fn get_msg(&self, fid: Fid) -> Option<&Self> {
        match self.find(fid)? {
            Field::Msg(value) => Some(value.as_ref()),
            _ => None,
        }
    }

    fn get_msg_vector(&self, fid: Fid) -> Option<&[Self]> {
        match self.find(fid)? {
            Field::Vector(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    fn for_each_field<F>(&self, mut visit: F)
    where
        F: FnMut(FieldRef<'_, Self>),
    {
        for (fid, field) in &self.fields {
            let value = match field {
                Field::Char(value) => FieldView::Char(*value),
                Field::I64(value) => FieldView::I64(*value),
                Field::U64(value) => FieldView::U64(*value),
                Field::F64(value) => FieldView::F64(*value),
                Field::Price(value) => FieldView::Price(*value),
                Field::Str(value) => FieldView::Str(value.as_str()),
                Field::Msg(value) => FieldView::Msg(value.as_ref()),
                Field::Vector(values) => FieldView::Vector(values.as_slice()),
            };
            visit(FieldRef { fid: *fid, value });
        }
    }
}

trait CloneFromSliceResize<T> {
    fn clone_from_slice_resize(&mut self, values: &[T]);
}

impl<T: Clone> CloneFromSliceResize<T> for Vec<T> {
    /// Overwrites existing elements in place before growing or truncating.
    fn clone_from_slice_resize(&mut self, values: &[T]) {
        self.truncate(values.len());
        let reused = self.len();
        for (slot, value) in self.iter_mut().zip(values) {
            slot.clone_from(value);
        }
        self.extend_from_slice(&values[reused..]);
    }
}
