//! ListCreditPackagesHandler - what the purchase page can offer.

use crate::application::handlers::payments::ProductCatalog;
use crate::domain::billing::{
    CreditPackage, PackageType, CUSTOM_CREDITS_PER_DOLLAR, CUSTOM_MAX_DOLLARS, CUSTOM_MIN_DOLLARS,
};

/// A catalog package and whether a vendor product backs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOffer {
    pub package: CreditPackage,
    pub available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomAmountOffer {
    pub min_dollars: i64,
    pub max_dollars: i64,
    pub credits_per_dollar: i64,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCreditPackagesResult {
    pub packages: Vec<PackageOffer>,
    pub custom: CustomAmountOffer,
}

pub struct ListCreditPackagesHandler {
    catalog: ProductCatalog,
}

impl ListCreditPackagesHandler {
    pub fn new(catalog: ProductCatalog) -> Self {
        Self { catalog }
    }

    pub fn handle(&self) -> ListCreditPackagesResult {
        let packages = CreditPackage::catalog()
            .into_iter()
            .map(|package| PackageOffer {
                available: self.catalog.credit_product(package.package_type).is_ok(),
                package,
            })
            .collect();

        ListCreditPackagesResult {
            packages,
            custom: CustomAmountOffer {
                min_dollars: CUSTOM_MIN_DOLLARS,
                max_dollars: CUSTOM_MAX_DOLLARS,
                credits_per_dollar: CUSTOM_CREDITS_PER_DOLLAR,
                available: self.catalog.credit_product(PackageType::Custom).is_ok(),
            },
        }
    }
}
