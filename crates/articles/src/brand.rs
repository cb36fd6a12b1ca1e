use serde::{Deserialize, Serialize};

use atelier_core::{Document, Entity, EntityId, RuleSet, SoftDelete, Stamp, Stamped};

use crate::record::{ArticleRecord, base_rules};

/// Article brand: a coded, named label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleBrand {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub code: String,
    pub name: String,
    #[serde(rename = "_deleted")]
    pub deleted: bool,
    #[serde(flatten)]
    pub stamp: Stamp,
}

impl ArticleBrand {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }
}

impl Entity for ArticleBrand {
    type Id = EntityId;

    fn id(&self) -> Option<&Self::Id> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Self::Id) {
        self.id = Some(id);
    }
}

impl SoftDelete for ArticleBrand {
    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn mark_deleted(&mut self) {
        self.deleted = true;
    }
}

impl Stamped for ArticleBrand {
    fn stamp_info(&self) -> &Stamp {
        &self.stamp
    }

    fn stamp_info_mut(&mut self) -> &mut Stamp {
        &mut self.stamp
    }
}

impl Document for ArticleBrand {
    const COLLECTION: &'static str = "core.article.ArticleBrand";
}

impl ArticleRecord for ArticleBrand {
    fn code(&self) -> &str {
        &self.code
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn rules() -> RuleSet<Self> {
        base_rules()
    }
}
