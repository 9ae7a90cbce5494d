//! Promotions Repositories

pub(crate) mod promotions;
pub(crate) mod usages;

pub(crate) use promotions::PgPromotionsRepository;
pub(crate) use usages::PgPromotionUsagesRepository;
