mod cache;
mod consolidated;
mod sections;
mod source;

pub use cache::{MenuCache, Snapshot};
pub use consolidated::{suggest, Allergens, ConsolidatedMenu, MealMenu, MenuItem, Nutrition};
pub use sections::{SectionClassifier, OTHER_SECTION};
pub use source::{source_for, FileMenuSource, HttpMenuSource, MenuSource};
