//! Remote provider implementations

mod engine;
mod nop;
mod s3;
mod ssh;

pub use engine::EngineRemoteProvider;
pub use nop::NopRemoteProvider;
pub use s3::S3RemoteProvider;
pub use ssh::SshRemoteProvider;
