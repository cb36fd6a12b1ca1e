use serde::{Deserialize, Serialize};

use atelier_core::{Document, Entity, EntityId, RuleSet, SoftDelete, Stamp, Stamped, required};

use crate::price::{PriceValue, check_price};
use crate::record::{ArticleRecord, base_rules};

/// Article variant: a sized, priced article with domestic and international
/// price lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleVariant {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    pub code: String,
    pub name: String,
    pub size: String,

    #[serde(rename = "domesticCOGS")]
    pub domestic_cogs: Option<PriceValue>,
    #[serde(rename = "domesticWholesale")]
    pub domestic_wholesale: Option<PriceValue>,
    #[serde(rename = "domesticRetail")]
    pub domestic_retail: Option<PriceValue>,
    #[serde(rename = "domesticSale")]
    pub domestic_sale: Option<PriceValue>,
    #[serde(rename = "internationalCOGS")]
    pub international_cogs: Option<PriceValue>,
    #[serde(rename = "internationalWholesale")]
    pub international_wholesale: Option<PriceValue>,
    #[serde(rename = "internationalRetail")]
    pub international_retail: Option<PriceValue>,
    #[serde(rename = "internationalSale")]
    pub international_sale: Option<PriceValue>,

    #[serde(rename = "_deleted")]
    pub deleted: bool,
    #[serde(flatten)]
    pub stamp: Stamp,
}

impl ArticleVariant {
    pub fn new(code: impl Into<String>, name: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            size: size.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set all eight prices to the same value.
    pub fn with_uniform_price(mut self, price: impl Into<PriceValue>) -> Self {
        let price = price.into();
        for slot in self.prices_mut() {
            *slot = Some(price.clone());
        }
        self
    }

    fn prices_mut(&mut self) -> [&mut Option<PriceValue>; 8] {
        [
            &mut self.domestic_cogs,
            &mut self.domestic_wholesale,
            &mut self.domestic_retail,
            &mut self.domestic_sale,
            &mut self.international_cogs,
            &mut self.international_wholesale,
            &mut self.international_retail,
            &mut self.international_sale,
        ]
    }
}

impl Entity for ArticleVariant {
    type Id = EntityId;

    fn id(&self) -> Option<&Self::Id> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Self::Id) {
        self.id = Some(id);
    }
}

impl SoftDelete for ArticleVariant {
    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn mark_deleted(&mut self) {
        self.deleted = true;
    }
}

impl Stamped for ArticleVariant {
    fn stamp_info(&self) -> &Stamp {
        &self.stamp
    }

    fn stamp_info_mut(&mut self) -> &mut Stamp {
        &mut self.stamp
    }
}

impl Document for ArticleVariant {
    const COLLECTION: &'static str = "core.article.ArticleVariant";
}

impl ArticleRecord for ArticleVariant {
    fn code(&self) -> &str {
        &self.code
    }

    fn name(&self) -> &str {
        &self.name
    }

    /// Blank price text is treated as an absent price.
    fn candidate(mut input: Self) -> Self {
        for slot in input.prices_mut() {
            if slot.as_ref().is_some_and(PriceValue::is_blank) {
                *slot = None;
            }
        }
        input
    }

    fn rules() -> RuleSet<Self> {
        base_rules()
            .rule("size", |v: &Self| required("size", &v.size))
            .rule("domesticCOGS", |v: &Self| {
                check_price("domesticCOGS", v.domestic_cogs.as_ref())
            })
            .rule("domesticWholesale", |v: &Self| {
                check_price("domesticWholesale", v.domestic_wholesale.as_ref())
            })
            .rule("domesticRetail", |v: &Self| {
                check_price("domesticRetail", v.domestic_retail.as_ref())
            })
            .rule("domesticSale", |v: &Self| {
                check_price("domesticSale", v.domestic_sale.as_ref())
            })
            .rule("internationalCOGS", |v: &Self| {
                check_price("internationalCOGS", v.international_cogs.as_ref())
            })
            .rule("internationalWholesale", |v: &Self| {
                check_price("internationalWholesale", v.international_wholesale.as_ref())
            })
            .rule("internationalRetail", |v: &Self| {
                check_price("internationalRetail", v.international_retail.as_ref())
            })
            .rule("internationalSale", |v: &Self| {
                check_price("internationalSale", v.international_sale.as_ref())
            })
    }

    /// Accepted prices are stored as integers.
    fn finalize(&mut self) {
        for slot in self.prices_mut() {
            if let Some(value) = slot.as_ref().filter(|v| !matches!(v, PriceValue::Integer(_))) {
                if let Ok(n) = value.parse() {
                    *slot = Some(PriceValue::Integer(n));
                }
            }
        }
    }
}
