pub mod cypher;
pub mod generator;

pub use cypher::CypherExporter;
pub use generator::ReportGenerator;
