pub mod memory;

pub use memory::InMemoryEventRepository;
