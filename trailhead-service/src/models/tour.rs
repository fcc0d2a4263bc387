//! Tour model: payloads, constraints, and descriptor

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::Result;
use crate::handlers::{Payload, PopulateKind, PopulateSpec, Resource};
use crate::services::slug::slugify;
use crate::store::{Document, Filter, FilterCondition};

use super::{user, Violations};

/// Store collection holding tours.
pub const COLLECTION: &str = "tours";

/// Accepted difficulty ratings.
pub const DIFFICULTIES: [&str; 3] = ["easy", "medium", "difficult"];

const POPULATE_GUIDES: PopulateSpec = PopulateSpec {
    field: "guides",
    collection: user::COLLECTION,
    select: &["name", "email", "photo", "role"],
    kind: PopulateKind::Ref,
};

const POPULATE_REVIEWS: PopulateSpec = PopulateSpec {
    field: "reviews",
    collection: super::review::COLLECTION,
    select: &[],
    kind: PopulateKind::Reverse {
        foreign_field: "tour",
    },
};

static POPULATE_MANY: [PopulateSpec; 1] = [POPULATE_GUIDES];
static POPULATE_ONE: [PopulateSpec; 2] = [POPULATE_GUIDES, POPULATE_REVIEWS];

/// Payload for creating a tour.
#[derive(Debug, Deserialize)]
pub struct CreateTour {
    pub name: Option<String>,
    pub duration: Option<f64>,
    pub max_group_size: Option<u32>,
    pub difficulty: Option<String>,
    pub price: Option<f64>,
    pub price_discount: Option<f64>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub image_cover: Option<String>,
    pub images: Option<Vec<String>>,
    pub start_dates: Option<Vec<String>>,
    pub secret_tour: Option<bool>,
    pub start_location: Option<Value>,
    pub locations: Option<Value>,
    pub guides: Option<Vec<String>>,
}

fn check_name(violations: &mut Violations, name: &str) {
    if name.len() < 10 {
        violations.add("name", "A tour name must have more or equal to 10 characters");
    }
    if name.len() > 40 {
        violations.add("name", "A tour name must have less or equal than 40 characters");
    }
}

fn check_difficulty(violations: &mut Violations, difficulty: &str) {
    if !DIFFICULTIES.contains(&difficulty) {
        violations.add(
            "difficulty",
            "Difficulty is either: easy, medium, difficult",
        );
    }
}

impl Payload for CreateTour {
    fn into_document(self) -> Result<Document> {
        let mut violations = Violations::new();

        let name = self.name.as_deref().map(str::trim).unwrap_or_default();
        if name.is_empty() {
            violations.add("name", "A tour must have a name");
        } else {
            check_name(&mut violations, name);
        }
        if self.duration.is_none() {
            violations.add("duration", "A tour must have a duration");
        }
        if self.max_group_size.is_none() {
            violations.add("max_group_size", "A tour must have a group size");
        }
        match self.difficulty.as_deref() {
            None => violations.add("difficulty", "A tour must have a difficulty"),
            Some(difficulty) => check_difficulty(&mut violations, difficulty),
        }
        if self.price.is_none() {
            violations.add("price", "A tour must have a price");
        }
        if let (Some(discount), Some(price)) = (self.price_discount, self.price) {
            if discount >= price {
                violations.add(
                    "price_discount",
                    "Discount price should be below the regular price",
                );
            }
        }
        let summary = self.summary.as_deref().map(str::trim).unwrap_or_default();
        if summary.is_empty() {
            violations.add("summary", "A tour must have a summary");
        }
        if self.image_cover.as_deref().map_or(true, str::is_empty) {
            violations.add("image_cover", "A tour must have a cover image");
        }

        let mut doc = Document::new();
        doc.insert("name".into(), json!(name));
        doc.insert("slug".into(), json!(slugify(name)));
        doc.insert("duration".into(), json!(self.duration));
        doc.insert("max_group_size".into(), json!(self.max_group_size));
        doc.insert("difficulty".into(), json!(self.difficulty));
        doc.insert("price".into(), json!(self.price));
        if let Some(discount) = self.price_discount {
            doc.insert("price_discount".into(), json!(discount));
        }
        doc.insert("summary".into(), json!(summary));
        if let Some(description) = self.description {
            doc.insert("description".into(), json!(description.trim()));
        }
        doc.insert("image_cover".into(), json!(self.image_cover));
        doc.insert("images".into(), json!(self.images.unwrap_or_default()));
        doc.insert(
            "start_dates".into(),
            json!(self.start_dates.unwrap_or_default()),
        );
        doc.insert(
            "secret_tour".into(),
            json!(self.secret_tour.unwrap_or(false)),
        );
        if let Some(start_location) = self.start_location {
            doc.insert("start_location".into(), start_location);
        }
        if let Some(locations) = self.locations {
            doc.insert("locations".into(), locations);
        }
        doc.insert("guides".into(), json!(self.guides.unwrap_or_default()));
        doc.insert("ratings_average".into(), json!(4.5));
        doc.insert("ratings_quantity".into(), json!(0));

        violations.finish(doc)
    }
}

/// Payload for partially updating a tour. Only provided fields are
/// validated and written.
#[derive(Debug, Deserialize)]
pub struct UpdateTour {
    pub name: Option<String>,
    pub duration: Option<f64>,
    pub max_group_size: Option<u32>,
    pub difficulty: Option<String>,
    pub price: Option<f64>,
    pub price_discount: Option<f64>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub image_cover: Option<String>,
    pub images: Option<Vec<String>>,
    pub start_dates: Option<Vec<String>>,
    pub secret_tour: Option<bool>,
    pub start_location: Option<Value>,
    pub locations: Option<Value>,
    pub guides: Option<Vec<String>>,
}

impl Payload for UpdateTour {
    fn into_document(self) -> Result<Document> {
        let mut violations = Violations::new();
        let mut doc = Document::new();

        if let Some(name) = self.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                violations.add("name", "A tour must have a name");
            } else {
                check_name(&mut violations, &name);
            }
            doc.insert("slug".into(), json!(slugify(&name)));
            doc.insert("name".into(), json!(name));
        }
        if let Some(difficulty) = &self.difficulty {
            check_difficulty(&mut violations, difficulty);
            doc.insert("difficulty".into(), json!(difficulty));
        }
        if let Some(duration) = self.duration {
            doc.insert("duration".into(), json!(duration));
        }
        if let Some(size) = self.max_group_size {
            doc.insert("max_group_size".into(), json!(size));
        }
        if let Some(price) = self.price {
            doc.insert("price".into(), json!(price));
        }
        if let Some(discount) = self.price_discount {
            if let Some(price) = self.price {
                if discount >= price {
                    violations.add(
                        "price_discount",
                        "Discount price should be below the regular price",
                    );
                }
            }
            doc.insert("price_discount".into(), json!(discount));
        }
        if let Some(summary) = self.summary {
            let summary = summary.trim().to_string();
            if summary.is_empty() {
                violations.add("summary", "A tour must have a summary");
            }
            doc.insert("summary".into(), json!(summary));
        }
        if let Some(description) = self.description {
            doc.insert("description".into(), json!(description.trim()));
        }
        if let Some(image_cover) = self.image_cover {
            doc.insert("image_cover".into(), json!(image_cover));
        }
        if let Some(images) = self.images {
            doc.insert("images".into(), json!(images));
        }
        if let Some(start_dates) = self.start_dates {
            doc.insert("start_dates".into(), json!(start_dates));
        }
        if let Some(secret_tour) = self.secret_tour {
            doc.insert("secret_tour".into(), json!(secret_tour));
        }
        if let Some(start_location) = self.start_location {
            doc.insert("start_location".into(), start_location);
        }
        if let Some(locations) = self.locations {
            doc.insert("locations".into(), locations);
        }
        if let Some(guides) = self.guides {
            doc.insert("guides".into(), json!(guides));
        }

        violations.finish(doc)
    }
}

/// Descriptor for the tours collection.
pub struct Tour;

impl Resource for Tour {
    const COLLECTION: &'static str = COLLECTION;
    const ENTITY: &'static str = "Tour";
    type Create = CreateTour;
    type Update = UpdateTour;

    fn populate_many() -> &'static [PopulateSpec] {
        &POPULATE_MANY
    }

    fn populate_one() -> &'static [PopulateSpec] {
        &POPULATE_ONE
    }

    fn unique_keys() -> &'static [&'static [&'static str]] {
        &[&["name"]]
    }

    fn scope_filter() -> Filter {
        Filter::new().and(FilterCondition::ne("secret_tour", true))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::AppError;

    use super::*;

    fn valid_create() -> CreateTour {
        CreateTour {
            name: Some("The Forest Hiker".to_string()),
            duration: Some(5.0),
            max_group_size: Some(25),
            difficulty: Some("easy".to_string()),
            price: Some(397.0),
            price_discount: None,
            summary: Some("Breathtaking hike through the Canadian Banff National Park".into()),
            description: None,
            image_cover: Some("tour-1-cover.jpg".to_string()),
            images: None,
            start_dates: None,
            secret_tour: None,
            start_location: None,
            locations: None,
            guides: None,
        }
    }

    #[test]
    fn test_create_applies_defaults_and_slug() {
        let doc = valid_create().into_document().unwrap();
        assert_eq!(doc["slug"], json!("the-forest-hiker"));
        assert_eq!(doc["ratings_average"], json!(4.5));
        assert_eq!(doc["ratings_quantity"], json!(0));
        assert_eq!(doc["secret_tour"], json!(false));
        assert_eq!(doc["images"], json!([]));
    }

    #[test]
    fn test_create_collects_every_violation() {
        let payload = CreateTour {
            name: None,
            duration: None,
            max_group_size: None,
            difficulty: Some("extreme".to_string()),
            price: None,
            price_discount: None,
            summary: None,
            description: None,
            image_cover: None,
            images: None,
            start_dates: None,
            secret_tour: None,
            start_location: None,
            locations: None,
            guides: None,
        };
        let err = payload.into_document().unwrap_err();
        let AppError::ValidationFailed(violations) = err else {
            panic!("expected validation failure");
        };
        let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "name",
                "duration",
                "max_group_size",
                "difficulty",
                "price",
                "summary",
                "image_cover"
            ]
        );
    }

    #[test]
    fn test_create_name_length_bounds() {
        let mut payload = valid_create();
        payload.name = Some("Too short".to_string());
        assert!(payload.into_document().is_err());

        let mut payload = valid_create();
        payload.name = Some("A".repeat(41));
        assert!(payload.into_document().is_err());
    }

    #[test]
    fn test_create_discount_must_be_below_price() {
        let mut payload = valid_create();
        payload.price_discount = Some(397.0);
        let err = payload.into_document().unwrap_err();
        let AppError::ValidationFailed(violations) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(violations[0].field, "price_discount");
    }

    #[test]
    fn test_update_is_partial() {
        let payload = UpdateTour {
            name: None,
            duration: None,
            max_group_size: None,
            difficulty: None,
            price: Some(99.0),
            price_discount: None,
            summary: None,
            description: None,
            image_cover: None,
            images: None,
            start_dates: None,
            secret_tour: None,
            start_location: None,
            locations: None,
            guides: None,
        };
        let doc = payload.into_document().unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc["price"], json!(99.0));
    }

    #[test]
    fn test_update_name_refreshes_slug() {
        let payload = UpdateTour {
            name: Some("The Mountain Biker".to_string()),
            duration: None,
            max_group_size: None,
            difficulty: None,
            price: None,
            price_discount: None,
            summary: None,
            description: None,
            image_cover: None,
            images: None,
            start_dates: None,
            secret_tour: None,
            start_location: None,
            locations: None,
            guides: None,
        };
        let doc = payload.into_document().unwrap();
        assert_eq!(doc["slug"], json!("the-mountain-biker"));
    }

    #[test]
    fn test_update_rejects_bad_difficulty() {
        let payload = UpdateTour {
            name: None,
            duration: None,
            max_group_size: None,
            difficulty: Some("impossible".to_string()),
            price: None,
            price_discount: None,
            summary: None,
            description: None,
            image_cover: None,
            images: None,
            start_dates: None,
            secret_tour: None,
            start_location: None,
            locations: None,
            guides: None,
        };
        assert!(payload.into_document().is_err());
    }

    #[test]
    fn test_scope_filter_hides_secret_tours() {
        let filter = Tour::scope_filter();
        let visible: Document = json!({"secret_tour": false}).as_object().unwrap().clone();
        let secret: Document = json!({"secret_tour": true}).as_object().unwrap().clone();
        assert!(filter.matches(&visible));
        assert!(!filter.matches(&secret));
    }
}
