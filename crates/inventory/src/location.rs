use serde::{Deserialize, Serialize};

use stockroom_core::{DomainResult, Entity, EntityKind, LocationId};

use crate::text::{self, KEY_MAX_LEN, NAME_MAX_LEN};

/// Input for creating or editing a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLocation {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
}

impl NewLocation {
    pub fn new(code: impl Into<String>, name: impl Into<String>, address: Option<&str>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            address: address.map(str::to_string),
        }
    }

    pub fn normalized(&self) -> DomainResult<Self> {
        Ok(Self {
            code: text::required("code", &self.code, KEY_MAX_LEN)?,
            name: text::required("name", &self.name, NAME_MAX_LEN)?,
            address: text::optional(self.address.as_deref()),
        })
    }
}

/// A place stock can sit: warehouse, store, quarantine area...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub code: String,
    pub name: String,
    pub address: Option<String>,
}

impl Location {
    pub fn create(id: LocationId, input: &NewLocation) -> DomainResult<Self> {
        let input = input.normalized()?;
        Ok(Self {
            id,
            code: input.code,
            name: input.name,
            address: input.address,
        })
    }

    pub fn edit(&mut self, input: &NewLocation) -> DomainResult<()> {
        let input = input.normalized()?;
        self.code = input.code;
        self.name = input.name;
        self.address = input.address;
        Ok(())
    }
}

impl Entity for Location {
    type Id = LocationId;
    const KIND: EntityKind = EntityKind::Location;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
