pub mod ask;
pub mod doctor;
pub mod pricing;
pub mod sessions;
