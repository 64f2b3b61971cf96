//! Keyed-field message container used on the publish and listen paths.
//!
//! The engine never depends on a concrete wire format. It writes and reads
//! through [`BookMessage`], a container of typed scalar fields, nested
//! messages and vectors of nested messages addressed by numeric field id.
//! [`MemoryMessage`] is the in-process implementation used by the listener,
//! the tests and the demos.
//!
//! Fields are walked with [`BookMessage::for_each_field`], which hands each
//! field to a closure as a borrowed [`FieldRef`]. The reference cannot outlive
//! the closure call, so there is no reusable field object to hold on to.

pub mod fields;
mod memory;

pub use fields::{BookFields, FieldDictionary, MsgType};
pub use memory::MemoryMessage;

use rust_decimal::Decimal;

/// Numeric field identifier.
pub type Fid = u16;

/// Borrowed view of one field's value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldView<'a, M> {
    Char(char),
    I64(i64),
    U64(u64),
    F64(f64),
    Price(Decimal),
    Str(&'a str),
    Msg(&'a M),
    Vector(&'a [M]),
}

/// A field visited during [`BookMessage::for_each_field`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef<'a, M> {
    pub fid: Fid,
    pub value: FieldView<'a, M>,
}

/// Typed get/set access to a keyed-field message.
///
/// Setters replace any existing value stored under the same fid. Numeric
/// getters convert between integer representations when the stored value fits.
pub trait BookMessage: Default + Clone {
    /// Removes every field.
    fn clear(&mut self);

    fn num_fields(&self) -> usize;

    fn has_field(&self, fid: Fid) -> bool;

    fn set_char(&mut self, fid: Fid, value: char);

    fn set_i64(&mut self, fid: Fid, value: i64);

    fn set_u64(&mut self, fid: Fid, value: u64);

    fn set_f64(&mut self, fid: Fid, value: f64);

    fn set_price(&mut self, fid: Fid, value: Decimal);

    fn set_str(&mut self, fid: Fid, value: &str);

    /// Stores a copy of `value` as a nested message.
    fn set_msg(&mut self, fid: Fid, value: &Self);

    /// Stores copies of `values` as a vector of nested messages.
    fn set_msg_vector(&mut self, fid: Fid, values: &[Self]);

    fn get_char(&self, fid: Fid) -> Option<char>;

    fn get_i64(&self, fid: Fid) -> Option<i64>;

    fn get_u64(&self, fid: Fid) -> Option<u64>;

    fn get_f64(&self, fid: Fid) -> Option<f64>;

    fn get_price(&self, fid: Fid) -> Option<Decimal>;

    fn get_str(&self, fid: Fid) -> Option<&str>;

    fn get_msg(&self, fid: Fid) -> Option<&Self>;

    fn get_msg_vector(&self, fid: Fid) -> Option<&[Self]>;

    /// Visits every field in insertion order.
    fn for_each_field<F>(&self, visit: F)
    where
        F: FnMut(FieldRef<'_, Self>);

    /// Number of elements in a vector field, zero when absent.
    fn vector_len(&self, fid: Fid) -> usize {
        self.get_msg_vector(fid).map_or(0, <[Self]>::len)
    }
}
