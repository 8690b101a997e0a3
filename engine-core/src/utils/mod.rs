pub mod dates;
pub mod numeric;
pub mod text;
