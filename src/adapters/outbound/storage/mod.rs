// Infrastructure error translation
pub mod error;

// Gateway over Apache object_store (memory, local disk, S3)
pub mod apache_object_store_gateway;

// Provider-specific construction
pub mod s3;

pub use apache_object_store_gateway::{ACL_METADATA_KEY, ApacheObjectStoreGateway, StoreFactory};
pub use s3::{S3Config, create_s3_store};
