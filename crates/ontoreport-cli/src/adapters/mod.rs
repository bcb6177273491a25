//! HTTP collaborators for the cross-validation step
pub mod annotator;
pub mod solr;

pub use annotator::HttpAnnotator;
pub use solr::SolrSearchIndex;
