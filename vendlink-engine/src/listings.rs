use std::collections::HashMap;

use tracing::{debug, error};
use vendlink_api::{ApiError, Category, Package, Result, StoreInfo};

use crate::SyncEngine;
use crate::cache::{
    CacheValue, KEY_CATEGORIES, KEY_INFORMATION, KEY_PACKAGE_SHORT_CODES, KEY_PACKAGES,
};
use crate::helpers;

/// Minimum spacing between periodic store info refreshes.
const INFO_REFRESH_COOLDOWN_SECS: i64 = 15 * 60;

impl SyncEngine {
    /// The store's `/information` payload, cached per the configured TTL.
    pub async fn fetch_store_info(&self) -> Result<StoreInfo> {
        let now = helpers::now();
        if let Some(CacheValue::Information(info)) = self.cache.get(KEY_INFORMATION, now) {
            return Ok(info);
        }

        let info = match self.api.information().await {
            Ok(info) => info,
            Err(err) => {
                if let ApiError::Parse { body, .. } = &err {
                    error!(response = %body, "failed to parse fetched store information");
                }
                return Err(err);
            }
        };

        self.api.set_store_identity(&info.account.name, &info.account.domain);
        self.cache.set(
            KEY_INFORMATION,
            CacheValue::Information(info.clone()),
            self.config.cache_ttl_minutes,
            now,
        );
        Ok(info)
    }

    /// Refresh cached categories and packages from the API.
    ///
    /// The two fetches are independent: one failing leaves the other's cache
    /// entry replaced, and a parse failure leaves the previous entry intact.
    pub async fn refresh_listings(&self) -> Result<()> {
        let (categories, packages) = tokio::join!(self.refresh_categories(), self.refresh_packages());
        categories?;
        packages?;
        Ok(())
    }

    async fn refresh_categories(&self) -> Result<Vec<Category>> {
        let listing = match self.api.listing().await {
            Ok(listing) => listing,
            Err(err) => {
                if let ApiError::Parse { body, .. } = &err {
                    error!(response = %body, "could not refresh category listings");
                }
                return Err(err);
            }
        };

        self.cache.set(
            KEY_CATEGORIES,
            CacheValue::Categories(listing.categories.clone()),
            self.config.cache_ttl_minutes,
            helpers::now(),
        );
        Ok(listing.categories)
    }

    /// Fetch the verbose package listing and rebuild the shortcode index.
    /// Shortcodes are `P1..Pn` by ascending display order, rebuilt wholesale
    /// with every refresh so no stale assignment can survive.
    async fn refresh_packages(&self) -> Result<Vec<Package>> {
        let packages = match self.api.all_packages(true).await {
            Ok(packages) => packages,
            Err(err) => {
                if let ApiError::Parse { body, .. } = &err {
                    error!(response = %body, "could not refresh package listings");
                }
                return Err(err);
            }
        };

        let mut ordered = packages.clone();
        ordered.sort_by_key(|package| package.order);
        let mut short_codes = HashMap::new();
        for (index, package) in ordered.into_iter().enumerate() {
            short_codes.insert(format!("P{}", index + 1), package);
        }

        let now = helpers::now();
        self.cache.set(
            KEY_PACKAGES,
            CacheValue::Packages(packages.clone()),
            self.config.cache_ttl_minutes,
            now,
        );
        self.cache.set(
            KEY_PACKAGE_SHORT_CODES,
            CacheValue::ShortCodes(short_codes),
            self.config.cache_ttl_minutes,
            now,
        );
        Ok(packages)
    }

    /// Look up a package by shortcode (`P3`) or numeric ID string.
    pub fn get_package_by_short_code_or_id(&self, token: &str) -> Option<Package> {
        let now = helpers::now();
        if let Some(CacheValue::ShortCodes(codes)) = self.cache.get(KEY_PACKAGE_SHORT_CODES, now) {
            if let Some(package) = codes.get(token) {
                return Some(package.clone());
            }
        }

        // No shortcode match; assume the token is a package id.
        if let Some(CacheValue::Packages(packages)) = self.cache.get(KEY_PACKAGES, now) {
            return packages.into_iter().find(|p| p.id.to_string() == token);
        }

        None
    }

    /// All categories with their packages, served from cache when valid.
    pub async fn get_categories(&self) -> Result<Vec<Category>> {
        if let Some(CacheValue::Categories(categories)) =
            self.cache.get(KEY_CATEGORIES, helpers::now())
        {
            return Ok(categories);
        }
        self.refresh_categories().await
    }

    /// All packages with descriptions, served from cache when valid. A miss
    /// refreshes packages and the shortcode index together.
    pub async fn get_packages(&self) -> Result<Vec<Package>> {
        if let Some(CacheValue::Packages(packages)) = self.cache.get(KEY_PACKAGES, helpers::now()) {
            return Ok(packages);
        }
        self.refresh_packages().await
    }

    /// Periodic driver keeping store info warm, gated by its own cooldown.
    pub async fn refresh_store_information(&self, force: bool) {
        debug!("refreshing store information");
        let now = helpers::now();
        {
            let mut cooldowns = self.cooldowns.lock().unwrap();
            if !force && now < cooldowns.info_refresh {
                debug!("skipping store info refresh; not time to be processed");
                return;
            }
            cooldowns.info_refresh = now + INFO_REFRESH_COOLDOWN_SECS;
        }

        // Calling places the information in the cache.
        if let Err(err) = self.fetch_store_info().await {
            debug!(%err, "store info refresh failed");
        }
    }
}
