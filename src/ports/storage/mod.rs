mod object_store_gateway;

pub use object_store_gateway::{ByteStream, CannedAcl, ObjectStoreGateway, StoreAck, StoreRequest};
