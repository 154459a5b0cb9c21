pub mod atomic;
pub mod xml;

pub use xml::XmlProjectRepository;
