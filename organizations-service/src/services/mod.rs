pub mod organizations;

pub use organizations::{Organization, OrganizationDirectory};
