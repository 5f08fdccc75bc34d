//! Immutable provisioning configuration.
//!
//! A [`ConfigurationValue`] is fully specified at construction and exposes no
//! mutating API. The factory forwards it untouched: the curve provisioner sees
//! only [`CurveParams`], the token provisioner only [`TokenParams`], and the
//! audit event carries the whole value.

use pairgate_canonical::{Amount, AssetId, Bips, PrincipalId, ValidationError};
use serde::{Deserialize, Serialize};

/// One provisioning request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ConfigurationBuilder")]
pub struct ConfigurationValue {
    name: String,
    symbol: String,
    #[serde(rename = "resourceURI")]
    resource_uri: String,
    creator: PrincipalId,
    creator_fee_bips: Bips,
    creator_royalty_bips: Bips,
    admin: PrincipalId,
    admin_fee_bips: Bips,
    referrer: PrincipalId,
    payment_asset: AssetId,
    base_price: Amount,
    linear_slope: Amount,
    inflection_price: Amount,
    inflection_point: u64,
}

/// The four parameters that fully determine a pricing curve, in constructor order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveParams {
    /// Price of the first unit.
    pub base_price: Amount,
    /// Price increase per unit below the inflection point.
    pub linear_slope: Amount,
    /// Price at the inflection point.
    pub inflection_price: Amount,
    /// Supply threshold where the curve changes shape.
    pub inflection_point: u64,
}

/// Identity, fee, and royalty parameters for the token resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenParams {
    /// Display name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Metadata URI.
    #[serde(rename = "resourceURI")]
    pub resource_uri: String,
    /// Creator principal.
    pub creator: PrincipalId,
    /// Creator trading fee.
    pub creator_fee_bips: Bips,
    /// Creator royalty on secondary transfers.
    pub creator_royalty_bips: Bips,
    /// Admin principal.
    pub admin: PrincipalId,
    /// Admin trading fee.
    pub admin_fee_bips: Bips,
    /// Referrer principal.
    pub referrer: PrincipalId,
    /// Asset used to pay for mints.
    pub payment_asset: AssetId,
}

impl ConfigurationValue {
    /// Starts an empty builder.
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Metadata URI.
    pub fn resource_uri(&self) -> &str {
        &self.resource_uri
    }

    /// Creator principal.
    pub fn creator(&self) -> &PrincipalId {
        &self.creator
    }

    /// Creator trading fee.
    pub fn creator_fee_bips(&self) -> Bips {
        self.creator_fee_bips
    }

    /// Creator royalty.
    pub fn creator_royalty_bips(&self) -> Bips {
        self.creator_royalty_bips
    }

    /// Admin principal.
    pub fn admin(&self) -> &PrincipalId {
        &self.admin
    }

    /// Admin trading fee.
    pub fn admin_fee_bips(&self) -> Bips {
        self.admin_fee_bips
    }

    /// Referrer principal.
    pub fn referrer(&self) -> &PrincipalId {
        &self.referrer
    }

    /// Payment asset.
    pub fn payment_asset(&self) -> &AssetId {
        &self.payment_asset
    }

    /// Base price.
    pub fn base_price(&self) -> Amount {
        self.base_price
    }

    /// Linear slope.
    pub fn linear_slope(&self) -> Amount {
        self.linear_slope
    }

    /// Inflection price.
    pub fn inflection_price(&self) -> Amount {
        self.inflection_price
    }

    /// Inflection point (supply threshold).
    pub fn inflection_point(&self) -> u64 {
        self.inflection_point
    }

    /// Curve constructor arguments. No other field reaches the curve.
    pub fn curve_params(&self) -> CurveParams {
        CurveParams {
            base_price: self.base_price,
            linear_slope: self.linear_slope,
            inflection_price: self.inflection_price,
            inflection_point: self.inflection_point,
        }
    }

    /// Token constructor arguments, excluding the curve handle.
    pub fn token_params(&self) -> TokenParams {
        TokenParams {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            resource_uri: self.resource_uri.clone(),
            creator: self.creator.clone(),
            creator_fee_bips: self.creator_fee_bips,
            creator_royalty_bips: self.creator_royalty_bips,
            admin: self.admin.clone(),
            admin_fee_bips: self.admin_fee_bips,
            referrer: self.referrer.clone(),
            payment_asset: self.payment_asset.clone(),
        }
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Collects fields for a [`ConfigurationValue`]; every field is required.
///
/// Also the deserialization shape: a JSON document with a missing field fails
/// with [`ValidationError::MissingField`] rather than a defaulted value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigurationBuilder {
    name: Option<String>,
    symbol: Option<String>,
    #[serde(rename = "resourceURI")]
    resource_uri: Option<String>,
    creator: Option<PrincipalId>,
    creator_fee_bips: Option<Bips>,
    creator_royalty_bips: Option<Bips>,
    admin: Option<PrincipalId>,
    admin_fee_bips: Option<Bips>,
    referrer: Option<PrincipalId>,
    payment_asset: Option<AssetId>,
    base_price: Option<Amount>,
    linear_slope: Option<Amount>,
    inflection_price: Option<Amount>,
    inflection_point: Option<u64>,
}

impl ConfigurationBuilder {
    /// Sets the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the ticker symbol.
    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Sets the metadata URI.
    pub fn resource_uri(mut self, uri: impl Into<String>) -> Self {
        self.resource_uri = Some(uri.into());
        self
    }

    /// Sets the creator principal.
    pub fn creator(mut self, creator: PrincipalId) -> Self {
        self.creator = Some(creator);
        self
    }

    /// Sets the creator trading fee.
    pub fn creator_fee_bips(mut self, bips: impl Into<Bips>) -> Self {
        self.creator_fee_bips = Some(bips.into());
        self
    }

    /// Sets the creator royalty.
    pub fn creator_royalty_bips(mut self, bips: impl Into<Bips>) -> Self {
        self.creator_royalty_bips = Some(bips.into());
        self
    }

    /// Sets the admin principal.
    pub fn admin(mut self, admin: PrincipalId) -> Self {
        self.admin = Some(admin);
        self
    }

    /// Sets the admin trading fee.
    pub fn admin_fee_bips(mut self, bips: impl Into<Bips>) -> Self {
        self.admin_fee_bips = Some(bips.into());
        self
    }

    /// Sets the referrer principal.
    pub fn referrer(mut self, referrer: PrincipalId) -> Self {
        self.referrer = Some(referrer);
        self
    }

    /// Sets the payment asset.
    pub fn payment_asset(mut self, asset: AssetId) -> Self {
        self.payment_asset = Some(asset);
        self
    }

    /// Sets the base price.
    pub fn base_price(mut self, price: impl Into<Amount>) -> Self {
        self.base_price = Some(price.into());
        self
    }

    /// Sets the linear slope.
    pub fn linear_slope(mut self, slope: impl Into<Amount>) -> Self {
        self.linear_slope = Some(slope.into());
        self
    }

    /// Sets the inflection price.
    pub fn inflection_price(mut self, price: impl Into<Amount>) -> Self {
        self.inflection_price = Some(price.into());
        self
    }

    /// Sets the inflection point.
    pub fn inflection_point(mut self, point: u64) -> Self {
        self.inflection_point = Some(point);
        self
    }

    /// Freezes the collected fields.
    pub fn build(self) -> Result<ConfigurationValue, ValidationError> {
        let name = required(self.name, "name")?;
        let symbol = required(self.symbol, "symbol")?;
        if name.trim().is_empty() {
            return Err(ValidationError::Empty("name"));
        }
        if symbol.trim().is_empty() {
            return Err(ValidationError::Empty("symbol"));
        }
        Ok(ConfigurationValue {
            name,
            symbol,
            resource_uri: required(self.resource_uri, "resourceURI")?,
            creator: required(self.creator, "creator")?,
            creator_fee_bips: required(self.creator_fee_bips, "creatorFeeBips")?,
            creator_royalty_bips: required(self.creator_royalty_bips, "creatorRoyaltyBips")?,
            admin: required(self.admin, "admin")?,
            admin_fee_bips: required(self.admin_fee_bips, "adminFeeBips")?,
            referrer: required(self.referrer, "referrer")?,
            payment_asset: required(self.payment_asset, "paymentAsset")?,
            base_price: required(self.base_price, "basePrice")?,
            linear_slope: required(self.linear_slope, "linearSlope")?,
            inflection_price: required(self.inflection_price, "inflectionPrice")?,
            inflection_point: required(self.inflection_point, "inflectionPoint")?,
        })
    }
}

impl TryFrom<ConfigurationBuilder> for ConfigurationValue {
    type Error = ValidationError;

    fn try_from(builder: ConfigurationBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::MissingField(field))
}
