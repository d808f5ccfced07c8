use super::TransactionKind;
use crate::macros::setter;
use crate::request::{EmptyResponse, Endpoint, RequestData};
use olevium_auth::Method;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use uuid::Uuid;

// Common

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    /// Whether the category groups income or expenses
    #[serde(rename = "type", alias = "kind")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

impl Category {
    pub fn is_subcategory(&self) -> bool {
        self.parent_id.is_some()
    }
}

// Requests

#[derive(Default, Debug, Clone, Serialize)]
pub struct ListCategories {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<TransactionKind>,
}

impl ListCategories {
    pub fn new() -> Self {
        Self::default()
    }

    setter!(opt kind: TransactionKind);
}

impl Endpoint for ListCategories {
    type Data = Self;
    type Response = Vec<Category>;

    fn endpoint(&self) -> Cow<'_, str> {
        "/categories".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        if self.kind.is_some() {
            RequestData::Query(self)
        } else {
            RequestData::Empty
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCategory {
    name: String,
    #[serde(rename = "type")]
    kind: TransactionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<Uuid>,
}

impl CreateCategory {
    pub fn new(name: impl Into<String>, kind: TransactionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            color: None,
            icon: None,
            parent_id: None,
        }
    }

    setter!(opt color: String);
    setter!(opt icon: String);
    setter!(opt parent_id: Uuid);
}

impl Endpoint for CreateCategory {
    type Data = Self;
    type Response = Category;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/categories".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateCategory {
    #[serde(skip)]
    category_id: Uuid,
    #[serde(flatten)]
    category: CategoryUpdate,
}

impl UpdateCategory {
    pub fn new(category_id: Uuid) -> Self {
        Self {
            category_id,
            category: CategoryUpdate::default(),
        }
    }

    setter!(opt category.name: String);
    setter!(opt category.color: String);
    setter!(opt category.icon: String);
}

impl Endpoint for UpdateCategory {
    type Data = Self;
    type Response = Category;
    const METHOD: Method = Method::PUT;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/categories/{}", self.category_id).into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

#[derive(Debug, Clone)]
pub struct DeleteCategory {
    category_id: Uuid,
}

impl DeleteCategory {
    pub fn new(category_id: Uuid) -> Self {
        Self { category_id }
    }
}

impl Endpoint for DeleteCategory {
    type Data = ();
    type Response = EmptyResponse;
    const METHOD: Method = Method::DELETE;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/categories/{}", self.category_id).into()
    }
}
