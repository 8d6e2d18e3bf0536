use axum::body::Bytes;
use mongodb::bson::{Bson, Document, doc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Collection holding product documents
pub const COLLECTION: &str = "products";

/// Product entity as stored in MongoDB
///
/// `_id` is kept as the hyphenated UUID string so filters built from a path
/// parameter match without BSON binary subtype juggling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", with = "uuid_as_string")]
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

impl Product {
    pub fn new(input: NewProduct) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            price: input.price,
            image_path: input.image_path,
        }
    }

    pub fn view(&self) -> ProductView {
        ProductView {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
            image_path: self.image_path.clone(),
        }
    }
}

/// Validated input for a new product record
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub image_path: Option<String>,
}

/// Public representation of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    /// Stored image path, `null` when the product has no image
    pub image_path: Option<String>,
}

/// Fields of the multipart create form, as read off the wire
#[derive(Debug, Default)]
pub struct CreateProductForm {
    pub name: Option<String>,
    pub price: Option<String>,
    pub image: Option<UploadedImage>,
}

/// A file part named `productImage`
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// File name as sent by the client, possibly including directories
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Multipart body accepted by `POST /api/products` (documentation only)
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductMultipart {
    pub name: String,
    pub price: f64,
    /// `image/jpeg` or `image/png`, at most 5 MiB
    #[schema(value_type = Option<String>, format = Binary)]
    pub product_image: Option<Vec<u8>>,
}

/// What happened to the file attached to a create request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum UploadOutcome {
    /// Stored; `path` became the product's `imagePath`
    Accepted { path: String },
    /// Not stored; the product was created without an image
    Rejected { reason: String },
}

/// One `{propName, value}` operation of a partial update
///
/// Only the listed properties can be changed, anything else fails to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "propName", content = "value", rename_all = "camelCase")]
pub enum ProductPatch {
    Name(String),
    Price(f64),
    ImagePath(Option<String>),
}

/// Net effect of a list of [`ProductPatch`] operations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub image_path: Option<Option<String>>,
}

impl ProductChanges {
    /// Apply `patches` in order; a later patch of the same field wins.
    pub fn from_patches(patches: impl IntoIterator<Item = ProductPatch>) -> Self {
        patches
            .into_iter()
            .fold(Self::default(), |mut changes, patch| {
                match patch {
                    ProductPatch::Name(name) => changes.name = Some(name),
                    ProductPatch::Price(price) => changes.price = Some(price),
                    ProductPatch::ImagePath(path) => changes.image_path = Some(path),
                }
                changes
            })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.image_path.is_none()
    }

    /// Body of the `$set` stage
    pub fn to_set_document(&self) -> Document {
        let mut set = Document::new();
        if let Some(name) = &self.name {
            set.insert("name", name.as_str());
        }
        if let Some(price) = self.price {
            set.insert("price", price);
        }
        if let Some(image_path) = &self.image_path {
            let value = image_path
                .as_deref()
                .map_or(Bson::Null, |p| Bson::String(p.to_string()));
            set.insert("imagePath", value);
        }
        set
    }

    pub fn to_update_document(&self) -> Document {
        doc! { "$set": self.to_set_document() }
    }
}

/// Hypermedia hint telling the client how to reach a resource next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LinkDescriptor {
    /// HTTP method
    #[serde(rename = "type")]
    pub method: String,
    pub url: String,
    /// Template of the request body, when one is needed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub body: Option<serde_json::Value>,
}

/// Builds absolute links below the public base URL of the products resource
#[derive(Debug, Clone)]
pub struct ResourceLinks {
    base_url: String,
}

impl ResourceLinks {
    /// `base_url` is the absolute URL of the collection, e.g. `http://localhost:8080/api/products`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET <base>/<id>`
    pub fn product(&self, id: &str) -> LinkDescriptor {
        LinkDescriptor {
            method: "GET".to_string(),
            url: format!("{}/{}", self.base_url, id),
            body: None,
        }
    }

    /// `GET <base>`
    pub fn collection(&self) -> LinkDescriptor {
        LinkDescriptor {
            method: "GET".to_string(),
            url: self.base_url.clone(),
            body: None,
        }
    }

    /// `POST <base>` with the shape of a create request
    pub fn recreate(&self) -> LinkDescriptor {
        LinkDescriptor {
            method: "POST".to_string(),
            url: self.base_url.clone(),
            body: Some(serde_json::json!({ "name": "String", "price": "Number" })),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductListEntry {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub image_path: Option<String>,
    pub request: LinkDescriptor,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductListResponse {
    pub count: usize,
    pub products: Vec<ProductListEntry>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedProductView {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub request: LinkDescriptor,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductResponse {
    pub message: String,
    pub created_product: CreatedProductView,
    /// Present only when a `productImage` part was sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_upload: Option<UploadOutcome>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductDetailResponse {
    pub product: ProductView,
    pub request: LinkDescriptor,
}

/// Acknowledgement for update and delete
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
    pub request: LinkDescriptor,
}

mod uuid_as_string {
    use serde::{Deserialize, Deserializer, Serializer, de};
    use uuid::Uuid;

    pub fn serialize<S: Serializer>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Uuid::parse_str(&raw).map_err(de::Error::custom)
    }
}
