pub mod remote;

pub use remote::{RemoteLoader, StaticSource, TaskSource, UnreachableSource};
