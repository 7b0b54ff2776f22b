pub mod generic_writer;
pub use generic_writer::{GenericWriter, WriterError, WRITER_SEPARATOR};

mod artifacts;
pub use artifacts::{partial_path, persist, write_population, write_dataset};
