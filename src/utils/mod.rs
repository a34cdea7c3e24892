pub mod suggest;
pub mod text;
