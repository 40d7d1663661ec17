use serde::{Deserialize, Serialize};

use stockroom_core::{DomainResult, Entity, EntityKind, ProductId};

use crate::text::{self, KEY_MAX_LEN, NAME_MAX_LEN};

/// Input for creating or editing a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewProduct {
    pub fn new(sku: impl Into<String>, name: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            description: description.map(str::to_string),
        }
    }

    /// Trim inputs and check required fields.
    ///
    /// Uniqueness of `sku` is a store concern and is not checked here.
    pub fn normalized(&self) -> DomainResult<Self> {
        Ok(Self {
            sku: text::required("sku", &self.sku, KEY_MAX_LEN)?,
            name: text::required("name", &self.name, NAME_MAX_LEN)?,
            description: text::optional(self.description.as_deref()),
        })
    }
}

/// A catalog product, identified internally by `id` and naturally by `sku`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
}

impl Product {
    /// Build a product from validated input.
    pub fn create(id: ProductId, input: &NewProduct) -> DomainResult<Self> {
        let input = input.normalized()?;
        Ok(Self {
            id,
            sku: input.sku,
            name: input.name,
            description: input.description,
        })
    }

    /// Replace editable fields (last write wins).
    pub fn edit(&mut self, input: &NewProduct) -> DomainResult<()> {
        let input = input.normalized()?;
        self.sku = input.sku;
        self.name = input.name;
        self.description = input.description;
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;
    const KIND: EntityKind = EntityKind::Product;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
