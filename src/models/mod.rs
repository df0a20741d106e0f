pub mod convert;
pub mod pod;
