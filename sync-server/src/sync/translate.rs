//! Remote shipment → local order translation
//!
//! Consumes [`OrderIntakeCommand`]s and assembles a [`NewOrderCommand`]
//! for the order aggregate. Translation is idempotent: an existence
//! re-check plus the aggregate's own number uniqueness make duplicate
//! intake a no-op.

use std::sync::Arc;

use chrono::Utc;

use shared::error::{AppError, ErrorCode};
use shared::market::{DELIVERY_OFFER_ID, RemoteOrder, local_order_number};
use shared::message::OrderIntakeCommand;
use shared::order::{
    ContactField, DeliveryType, FormFieldValue, NewOrderCommand, OrderDelivery, OrderId,
    PaymentType, ProductLine, ProfileType,
};
use shared::AppResult;

use crate::client::MegamarketClient;
use crate::services::{
    ContactKind, DeliveryDirectory, FieldKind, Geocoder, OrderStore, ProductCatalog,
    ProfileDirectory,
};

pub struct OrderTranslator {
    client: Arc<MegamarketClient>,
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn ProductCatalog>,
    geocoder: Arc<dyn Geocoder>,
    deliveries: Arc<dyn DeliveryDirectory>,
    profiles: Arc<dyn ProfileDirectory>,
}

impl OrderTranslator {
    pub fn new(
        client: Arc<MegamarketClient>,
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn ProductCatalog>,
        geocoder: Arc<dyn Geocoder>,
        deliveries: Arc<dyn DeliveryDirectory>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self {
            client,
            orders,
            catalog,
            geocoder,
            deliveries,
            profiles,
        }
    }

    /// Handle one intake command; all outcomes resolve to logs
    pub async fn handle(&self, command: &OrderIntakeCommand) {
        match self.translate(command).await {
            Ok(Some(id)) => {
                tracing::info!(shipment = command.shipment, order = %id, "Order created");
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(shipment = command.shipment, "Order translation failed: {e}");
            }
        }
    }

    /// Run the translation; `Ok(None)` means the order already exists
    pub async fn translate(&self, command: &OrderIntakeCommand) -> AppResult<Option<OrderId>> {
        let number = local_order_number(&command.shipment);
        if self.orders.exists_by_number(&number).await {
            tracing::info!(order = number, "Order already exists, intake skipped");
            return Ok(None);
        }

        let Some(remote) = self.client.fetch_order(&command.profile, &command.shipment).await
        else {
            return Err(AppError::with_message(
                ErrorCode::OrderNotFound,
                format!("marketplace shipment {} not found", command.shipment),
            ));
        };

        let (profile_type, delivery_type, payment) = classify(&remote);
        let contacts = self.contacts(&remote, profile_type).await;
        let comment = access_comment(&remote);
        let (products, delivery_price) = self.products(&remote).await?;

        // Raw address is the fallback; a successful geocode overwrites it
        let raw_address = remote
            .customer
            .as_ref()
            .and_then(|c| c.address.as_ref())
            .map(|a| a.source.clone())
            .unwrap_or_default();
        let remote_geo = remote
            .customer
            .as_ref()
            .and_then(|c| c.address.as_ref())
            .and_then(|a| a.geo.as_ref());

        let (address, latitude, longitude) = match self.geocoder.resolve(&raw_address).await {
            Some(geocoded) => (
                geocoded.address,
                Some(geocoded.latitude),
                Some(geocoded.longitude),
            ),
            None => (
                raw_address,
                remote_geo.map(|g| g.lat),
                remote_geo.map(|g| g.lon),
            ),
        };

        let fields = self
            .deliveries
            .fields(delivery_type)
            .await
            .into_iter()
            .filter(|field| field.kind == FieldKind::Address)
            .map(|field| FormFieldValue {
                field: field.name,
                value: address.clone(),
            })
            .collect();

        let order = NewOrderCommand {
            number,
            created: remote.shipment_date.unwrap_or_else(Utc::now),
            profile: command.profile,
            profile_type,
            payment,
            delivery: OrderDelivery {
                delivery_type,
                date: remote
                    .handover
                    .as_ref()
                    .and_then(|h| h.delivery_interval.as_ref())
                    .map(|i| i.date_from),
                address,
                latitude,
                longitude,
                price: delivery_price,
                fields,
                event: self.deliveries.current_event(delivery_type).await,
            },
            contacts,
            comment,
            products,
        };

        self.orders.create(order).await.map(Some)
    }

    /// Contact fields present in the profile-type schema with non-empty values
    async fn contacts(&self, remote: &RemoteOrder, profile_type: ProfileType) -> Vec<ContactField> {
        let Some(customer) = remote.customer.as_ref() else {
            return Vec::new();
        };

        self.profiles
            .contact_fields(profile_type)
            .await
            .into_iter()
            .filter_map(|kind| {
                let value = match kind {
                    ContactKind::Email => customer.email.as_deref(),
                    ContactKind::FullName => customer.customer_full_name.as_deref(),
                    ContactKind::Phone => customer.phone.as_deref(),
                }?;
                if value.is_empty() {
                    return None;
                }
                Some(ContactField {
                    field: kind.name().to_string(),
                    value: value.to_string(),
                })
            })
            .collect()
    }

    /// Aggregate line items by article; the delivery sentinel only sets the
    /// delivery cost. An unresolvable article fails the whole translation.
    async fn products(&self, remote: &RemoteOrder) -> AppResult<(Vec<ProductLine>, i64)> {
        let mut lines: Vec<ProductLine> = Vec::new();
        let mut delivery_price = 0;

        for item in &remote.items {
            if item.offer_id == DELIVERY_OFFER_ID {
                delivery_price = item.final_price;
                continue;
            }

            if let Some(line) = lines.iter_mut().find(|line| line.article == item.offer_id) {
                line.quantity += item.quantity;
                continue;
            }

            let Some(product) = self.catalog.find_by_article(&item.offer_id).await else {
                tracing::error!(article = item.offer_id, "Unknown product article");
                return Err(AppError::with_message(
                    ErrorCode::ProductNotFound,
                    format!("product article {} is not in the catalog", item.offer_id),
                ));
            };

            lines.push(ProductLine {
                article: item.offer_id.clone(),
                price: item.final_price,
                quantity: item.quantity,
                product,
            });
        }

        Ok((lines, delivery_price))
    }
}

/// Delivery/payment/profile-type triple derived from the fulfillment scheme
fn classify(remote: &RemoteOrder) -> (ProfileType, DeliveryType, PaymentType) {
    let deposited = remote.handover.as_ref().map(|h| h.deposited_amount).unwrap_or(0);

    if remote.service_scheme().is_some_and(|s| s.is_dbs()) {
        let payment = if deposited == 0 {
            PaymentType::CashOnDelivery
        } else {
            PaymentType::DbsMegamarket
        };
        (ProfileType::DbsMegamarket, DeliveryType::DbsMegamarket, payment)
    } else {
        (
            ProfileType::FbsMegamarket,
            DeliveryType::FbsMegamarket,
            PaymentType::FbsMegamarket,
        )
    }
}

/// Customer comment assembled from the address access flags
///
/// Empty and false flags carry no fragment; the customer's free comment
/// goes last. `None` when nothing applies.
fn access_comment(remote: &RemoteOrder) -> Option<String> {
    let access = remote
        .customer
        .as_ref()
        .and_then(|c| c.address.as_ref())
        .and_then(|a| a.access.as_ref())?;

    let mut parts: Vec<String> = Vec::new();
    if access.detached_house {
        parts.push("Private house".to_string());
    }
    if let Some(entrance) = non_empty(&access.entrance) {
        parts.push(format!("Entrance {entrance}"));
    }
    if let Some(intercom) = non_empty(&access.intercom) {
        parts.push(format!("Intercom {intercom}"));
    }
    if let Some(floor) = non_empty(&access.floor) {
        parts.push(format!("Floor {floor}"));
    }
    if let Some(apartment) = non_empty(&access.apartment) {
        parts.push(format!("Apartment {apartment}"));
    }
    if access.cargo_elevator {
        parts.push("Cargo elevator".to_string());
    }
    if let Some(comment) = non_empty(&access.comment) {
        parts.push(comment.to_string());
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
