//! Data models for procdocs

mod image;
mod record;
mod remote_record;

pub use image::{ImageAttachment, ImageSource, MAX_UPLOAD_BATCH_BYTES};
pub use record::{Origin, Record, LOCAL_ID_PREFIX};
pub use remote_record::{NewRemoteRecord, RemoteRecord, RemoteSnapshot};
