pub mod genome;
pub mod layout;

pub use genome::read_genome_file;
pub use layout::ProjectLayout;
