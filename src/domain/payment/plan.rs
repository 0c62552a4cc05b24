use serde::Serialize;

/// A credit bundle; `price_cents` is `None` for plans that cannot be bought
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub id: &'static str,
    pub credits: i64,
    pub price_cents: Option<i64>,
}

impl Plan {
    pub fn is_purchasable(&self) -> bool {
        self.price_cents.is_some()
    }
}

pub const PLANS: [Plan; 3] = [
    Plan {
        id: "free",
        credits: 25,
        price_cents: None,
    },
    Plan {
        id: "pro",
        credits: 100,
        price_cents: Some(999),
    },
    Plan {
        id: "enterprise",
        credits: 500,
        price_cents: Some(4999),
    },
];

/// Look up a plan by id
pub fn find_plan(id: &str) -> Option<&'static Plan> {
    PLANS.iter().find(|plan| plan.id == id)
}
