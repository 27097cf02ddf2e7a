pub(crate) mod analytics;
pub(crate) mod counter;
pub(crate) mod landing;
pub(crate) mod reviews;
pub(crate) mod rows;
