//! Transactional email for customers.
//!
//! Uses SMTP via lettre for delivery with Askama HTML and plain text
//! templates. Sending happens on detached tasks after the triggering write
//! has committed; a failed send is logged and never reaches the caller.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use ellectra_core::{Email, OrderId};

use crate::config::SmtpConfig;
use crate::models::order::OrderItemView;

/// Content of an order confirmation.
#[derive(Debug, Clone)]
pub struct OrderPlacedMessage {
    pub to: Email,
    pub customer_name: String,
    pub order_id: OrderId,
    pub items: Vec<OrderItemView>,
    pub total_amount: Decimal,
    pub delivery_type: String,
}

/// Content of a cart update notice.
#[derive(Debug, Clone)]
pub struct CartUpdatedMessage {
    pub to: Email,
    pub customer_name: String,
    pub product_name: String,
    pub product_img: String,
    pub quantity: i32,
    pub price_per_item: Decimal,
}

#[derive(Template)]
#[template(path = "email/order_placed.html")]
struct OrderPlacedHtml<'a> {
    message: &'a OrderPlacedMessage,
    orders_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_placed.txt")]
struct OrderPlacedText<'a> {
    message: &'a OrderPlacedMessage,
    orders_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/cart_updated.html")]
struct CartUpdatedHtml<'a> {
    message: &'a CartUpdatedMessage,
    cart_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/cart_updated.txt")]
struct CartUpdatedText<'a> {
    message: &'a CartUpdatedMessage,
    cart_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// SMTP mailer for customer notifications.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    frontend_url: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &SmtpConfig, frontend_url: &str) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_email.clone(),
            frontend_url: frontend_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Send an order confirmation.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_placed(&self, message: &OrderPlacedMessage) -> Result<(), EmailError> {
        let (text, html) = render_order_placed(message, &self.orders_url())?;
        let subject = format!("Order {} confirmed", message.order_id);
        self.send_multipart_email(&message.to, &subject, &text, &html)
            .await
    }

    /// Send a cart update notice.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_cart_updated(&self, message: &CartUpdatedMessage) -> Result<(), EmailError> {
        let (text, html) = render_cart_updated(message, &self.cart_url())?;
        self.send_multipart_email(&message.to, "Your cart has been updated", &text, &html)
            .await
    }

    fn orders_url(&self) -> String {
        format!("{}/orders", self.frontend_url)
    }

    fn cart_url(&self) -> String {
        format!("{}/cart", self.frontend_url)
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &Email,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .as_str()
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

fn render_order_placed(
    message: &OrderPlacedMessage,
    orders_url: &str,
) -> Result<(String, String), EmailError> {
    let text = OrderPlacedText {
        message,
        orders_url,
    }
    .render()?;
    let html = OrderPlacedHtml {
        message,
        orders_url,
    }
    .render()?;
    Ok((text, html))
}

fn render_cart_updated(
    message: &CartUpdatedMessage,
    cart_url: &str,
) -> Result<(String, String), EmailError> {
    let text = CartUpdatedText { message, cart_url }.render()?;
    let html = CartUpdatedHtml { message, cart_url }.render()?;
    Ok((text, html))
}

/// Fire-and-forget dispatch of customer notifications.
///
/// Without SMTP configuration every notification is logged and skipped.
#[derive(Clone, Default)]
pub struct Notifier {
    email: Option<EmailService>,
}

impl Notifier {
    #[must_use]
    pub const fn new(email: Option<EmailService>) -> Self {
        Self { email }
    }

    /// Notifier that never sends anything.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { email: None }
    }

    /// Send an order confirmation on a detached task.
    pub fn order_placed(&self, message: OrderPlacedMessage) {
        let Some(email) = self.email.clone() else {
            tracing::debug!(order_id = %message.order_id, "SMTP not configured, skipping order email");
            return;
        };

        tokio::spawn(async move {
            if let Err(e) = email.send_order_placed(&message).await {
                tracing::warn!(
                    error = %e,
                    order_id = %message.order_id,
                    "Failed to send order confirmation"
                );
            }
        });
    }

    /// Send a cart update notice on a detached task.
    pub fn cart_updated(&self, message: CartUpdatedMessage) {
        let Some(email) = self.email.clone() else {
            tracing::debug!(to = %message.to, "SMTP not configured, skipping cart email");
            return;
        };

        tokio::spawn(async move {
            if let Err(e) = email.send_cart_updated(&message).await {
                tracing::warn!(error = %e, to = %message.to, "Failed to send cart update email");
            }
        });
    }
}
