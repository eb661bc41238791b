pub mod machine;
pub mod register_allocation;
