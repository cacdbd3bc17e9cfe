//! Pure text functions: normalization, dish matching, price
//! extraction, transliteration. No I/O, no state.
//!
//! Offsets returned by [`find_dish`] are char offsets into
//! [`normalize`]`(text)` (punctuation preserved), so the same offset
//! can anchor [`extract_price`] over the same normalized text.

mod matcher;
mod normalize;
mod price;
mod translit;

pub use matcher::{dish_variants, find_dish};
pub use normalize::{normalize, normalize_for_search};
pub use price::extract_price;
pub use translit::transliterate;
