mod builder;
mod injector;

pub use builder::InjectorBuilder;
pub use injector::Injector;
