/// A company project as persisted in the backing XML document.
///
/// The `id` is carried as an attribute on the project element; the remaining
/// fields are child elements. Fields absent from the document read as empty
/// strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub abbreviation: String,
    pub customer: String,
}
