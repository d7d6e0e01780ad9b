//! # Wire Protocol
//!
//! DTOs for the remote Sales and Catalog APIs.
//!
//! All fields are `camelCase` on the wire. The local sale id travels as
//! `localSaleId` and is the idempotency key: the remote deduplicates on it,
//! so replaying a push after a lost response cannot double-record a sale.
//!
//! ```text
//! PUSH   POST /sales                  SalePushRequest → SalePushResponse
//! PULL   GET  /products?since=&limit= → Vec<ProductRecord>
//!        GET  /stock?since=&limit=    → Vec<StockRecord>
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mostrador_core::{
    LocalSale, LocalSaleItem, PaymentMethod, Product, ServerSaleRefs, Stock,
};

// =============================================================================
// Sale Push
// =============================================================================

/// One line of a pushed sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalePushItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_percent: f64,
}

/// Request body for `POST /sales`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalePushRequest {
    /// Local sale id; the remote's idempotency key.
    pub local_sale_id: String,

    pub items: Vec<SalePushItem>,
    pub payment_method: PaymentMethod,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    /// CUIT/CUIL of the customer, required by the remote for invoice class A.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_cuit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub generate_invoice: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_type: Option<String>,
}

impl SalePushRequest {
    /// Builds a push request from a ledger sale and its line snapshots.
    pub fn from_sale(sale: &LocalSale, items: &[LocalSaleItem]) -> Self {
        SalePushRequest {
            local_sale_id: sale.id.clone(),
            items: items
                .iter()
                .map(|item| SalePushItem {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price_cents,
                    discount_percent: item.discount_percent,
                })
                .collect(),
            payment_method: sale.payment_method,
            customer_name: sale.customer_name.clone(),
            customer_email: sale.customer_email.clone(),
            customer_cuit: sale.customer_tax_id.clone(),
            customer_phone: sale.customer_phone.clone(),
            notes: sale.notes.clone(),
            generate_invoice: sale.generate_invoice,
            invoice_type: sale.invoice_type.clone(),
        }
    }
}

/// Response body for an accepted `POST /sales`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalePushResponse {
    /// Remote sale id.
    pub id: String,
    /// Server-assigned sale number.
    pub sale_number: String,
    /// Invoice number, when one was generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    /// Fiscal authorization code (CAE), when an invoice was generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cae: Option<String>,
}

impl From<SalePushResponse> for ServerSaleRefs {
    fn from(resp: SalePushResponse) -> Self {
        ServerSaleRefs {
            server_id: resp.id,
            sale_number: resp.sale_number,
            invoice_number: resp.invoice_number,
            cae: resp.cae,
        }
    }
}

// =============================================================================
// Catalog Pull
// =============================================================================

/// A product record as the remote serves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: String,
    pub tenant_id: String,
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub barcode: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub cost_cents: Option<i64>,
    #[serde(default)]
    pub tax_rate: Option<f64>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub is_active: bool,
}

impl ProductRecord {
    /// Converts into a mirror row, stamping the refresh time.
    pub fn into_mirror(self, synced_at: DateTime<Utc>) -> Product {
        Product {
            id: self.id,
            tenant_id: self.tenant_id,
            sku: self.sku,
            name: self.name,
            barcode: self.barcode,
            price_cents: self.price_cents,
            cost_cents: self.cost_cents,
            tax_rate: self.tax_rate,
            category_id: self.category_id,
            image_url: self.image_url,
            is_active: self.is_active,
            synced_at,
        }
    }
}

/// A stock record as the remote serves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub id: String,
    pub tenant_id: String,
    pub product_id: String,
    pub location_id: String,
    pub quantity: i64,
}

impl StockRecord {
    /// Converts into a mirror row, stamping the refresh time.
    pub fn into_mirror(self, synced_at: DateTime<Utc>) -> Stock {
        Stock {
            id: self.id,
            tenant_id: self.tenant_id,
            product_id: self.product_id,
            location_id: self.location_id,
            quantity: self.quantity,
            synced_at,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mostrador_core::SyncStatus;

    fn test_sale() -> LocalSale {
        LocalSale {
            id: "local-1".to_string(),
            tenant_id: "t-1".to_string(),
            location_id: "l-1".to_string(),
            subtotal_cents: 1210,
            tax_cents: 210,
            discount_cents: 0,
            total_cents: 1210,
            customer_name: Some("Ana".to_string()),
            customer_email: None,
            customer_tax_id: Some("20-12345678-9".to_string()),
            customer_phone: None,
            payment_method: PaymentMethod::Cash,
            generate_invoice: true,
            invoice_type: Some("B".to_string()),
            notes: None,
            sync_status: SyncStatus::Pending,
            synced_at: None,
            sync_error: None,
            server_id: None,
            sale_number: None,
            invoice_number: None,
            cae: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_push_request_wire_shape() {
        let items = vec![LocalSaleItem {
            id: "i-1".to_string(),
            sale_id: "local-1".to_string(),
            product_id: "p1".to_string(),
            name: "Yerba".to_string(),
            sku: "SKU-p1".to_string(),
            quantity: 2,
            unit_price_cents: 605,
            tax_rate: 0.21,
            discount_percent: 0.0,
            line_total_cents: 1210,
        }];

        let request = SalePushRequest::from_sale(&test_sale(), &items);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["localSaleId"], "local-1");
        assert_eq!(json["paymentMethod"], "cash");
        assert_eq!(json["customerCuit"], "20-12345678-9");
        assert_eq!(json["items"][0]["productId"], "p1");
        assert_eq!(json["items"][0]["unitPriceCents"], 605);
        // Absent optionals stay off the wire entirely
        assert!(json.get("customerEmail").is_none());
    }

    #[test]
    fn test_push_response_parses_without_invoice_fields() {
        let resp: SalePushResponse =
            serde_json::from_str(r#"{"id":"srv-1","saleNumber":"0001-00000042"}"#).unwrap();

        let refs: ServerSaleRefs = resp.into();
        assert_eq!(refs.server_id, "srv-1");
        assert!(refs.invoice_number.is_none());
        assert!(refs.cae.is_none());
    }

    #[test]
    fn test_product_record_into_mirror_stamps_time() {
        let record: ProductRecord = serde_json::from_str(
            r#"{"id":"p1","tenantId":"t-1","sku":"SKU-p1","name":"Yerba","priceCents":2500,"isActive":true}"#,
        )
        .unwrap();

        let now = Utc::now();
        let mirror = record.into_mirror(now);
        assert_eq!(mirror.id, "p1");
        assert_eq!(mirror.synced_at, now);
        assert!(mirror.tax_rate.is_none());
    }
}
