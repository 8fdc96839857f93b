//! # Counter Shell
//!
//! Line-oriented front end for the counter commands.
//!
//! ## Commands
//! ```text
//! products [query]                  search the catalog (empty lists all)
//! clients [refresh]                 list clients
//! client <id> | client none         select / deselect the client
//! add <product> [unit|dose]         add one unit or dose
//! qty <product> <unit|dose> <n>     set a line quantity (0 removes)
//! toggle <product> <unit|dose>      switch a line to the other mode
//! rm <product> <unit|dose>          remove a line
//! linediscount <product> <mode> <amount>
//! discount <amount>                 order-level discount
//! cart                              show the cart
//! preview [usd=] [bs=] [rate=] [credit=] [method=] [ref=]
//! pay     [usd=] [bs=] [rate=] [credit=] [method=] [ref=]
//! refresh                           refetch catalog and re-check the cart
//! clear                             start a new sale
//! help | quit
//! ```

use std::fmt::Write as _;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use vetpos_core::validation::{parse_money, parse_quantity};
use vetpos_core::{Client, ExchangeRate, Money, PaymentInstructions, Quantity, SaleMode};

use crate::commands::cart::{self, CartResponse};
use crate::commands::catalog::{self, ProductView};
use crate::commands::sale::{self, CheckoutResponse};
use crate::error::ApiError;
use crate::notification::{Notification, NotificationLevel};
use crate::state::{BackendState, CatalogState, ConfigState, SessionState};

const HELP: &str = "\
products [query]                  search the catalog
clients [refresh]                 list clients
client <id> | client none         select / deselect the client
add <product> [unit|dose]         add one unit or dose
qty <product> <unit|dose> <n>     set a line quantity (0 removes)
toggle <product> <unit|dose>      switch a line to the other mode
rm <product> <unit|dose>          remove a line
linediscount <product> <unit|dose> <amount>
discount <amount>                 order-level discount
cart                              show the cart
preview key=value...              check a payment without sending
pay key=value...                  submit the sale (keys: usd bs rate credit method ref)
refresh                           refetch catalog and re-check the cart
clear                             start a new sale
quit";

// =============================================================================
// Parsing
// =============================================================================

/// One parsed line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Products { query: String },
    Clients { refresh: bool },
    SelectClient { client_id: String },
    ClearClient,
    Add { product_id: String, mode: SaleMode },
    Quantity { product_id: String, mode: SaleMode, quantity: Quantity },
    Toggle { product_id: String, mode: SaleMode },
    Remove { product_id: String, mode: SaleMode },
    LineDiscount { product_id: String, mode: SaleMode, amount: Money },
    OrderDiscount { amount: Money },
    Cart,
    Preview(PaymentInstructions),
    Pay(PaymentInstructions),
    Refresh,
    Clear,
    Help,
    Quit,
}

fn parse_mode(word: &str) -> Result<SaleMode, ApiError> {
    match word.to_lowercase().as_str() {
        "unit" | "units" | "u" => Ok(SaleMode::FullUnit),
        "dose" | "doses" | "d" => Ok(SaleMode::Dose),
        other => Err(ApiError::validation(format!(
            "Unknown sale mode '{}', use unit or dose",
            other
        ))),
    }
}

fn required<'a>(args: &[&'a str], index: usize, what: &str) -> Result<&'a str, ApiError> {
    args.get(index)
        .copied()
        .ok_or_else(|| ApiError::validation(format!("Missing {}", what)))
}

fn parse_payment(args: &[&str]) -> Result<PaymentInstructions, ApiError> {
    let mut payment = PaymentInstructions::default();

    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| ApiError::validation(format!("Expected key=value, got '{}'", arg)))?;

        match key.to_lowercase().as_str() {
            "usd" => payment.amount_paid_base = parse_money("amount paid (base currency)", value)?,
            "bs" => payment.amount_paid_local = parse_money("amount paid (local currency)", value)?,
            "credit" => payment.credit_used = parse_money("credit used", value)?,
            "rate" => {
                let rate: ExchangeRate = value.parse().map_err(|e| {
                    ApiError::validation(format!("exchange rate has invalid format: {}", e))
                })?;
                payment.exchange_rate = Some(rate);
            }
            "method" => payment.payment_method_id = Some(value.to_string()),
            "ref" => payment.reference = Some(value.to_string()),
            other => {
                return Err(ApiError::validation(format!("Unknown payment field '{}'", other)))
            }
        }
    }

    Ok(payment)
}

/// Parses a line of input. Blank lines give `None`.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, ApiError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, args)) = words.split_first() else {
        return Ok(None);
    };

    let command = match verb.to_lowercase().as_str() {
        "products" | "p" => ShellCommand::Products {
            query: args.join(" "),
        },
        "clients" => ShellCommand::Clients {
            refresh: args.first().is_some_and(|a| *a == "refresh"),
        },
        "client" => match required(args, 0, "client id")? {
            "none" => ShellCommand::ClearClient,
            id => ShellCommand::SelectClient {
                client_id: id.to_string(),
            },
        },
        "add" | "a" => ShellCommand::Add {
            product_id: required(args, 0, "product id")?.to_string(),
            mode: args.get(1).map(|m| parse_mode(m)).transpose()?.unwrap_or(SaleMode::FullUnit),
        },
        "qty" | "q" => {
            let mode = parse_mode(required(args, 1, "sale mode")?)?;
            ShellCommand::Quantity {
                product_id: required(args, 0, "product id")?.to_string(),
                mode,
                quantity: parse_quantity(required(args, 2, "quantity")?, mode)?,
            }
        }
        "toggle" | "t" => ShellCommand::Toggle {
            product_id: required(args, 0, "product id")?.to_string(),
            mode: parse_mode(required(args, 1, "sale mode")?)?,
        },
        "rm" | "remove" => ShellCommand::Remove {
            product_id: required(args, 0, "product id")?.to_string(),
            mode: parse_mode(required(args, 1, "sale mode")?)?,
        },
        "linediscount" => ShellCommand::LineDiscount {
            product_id: required(args, 0, "product id")?.to_string(),
            mode: parse_mode(required(args, 1, "sale mode")?)?,
            amount: parse_money("line discount", required(args, 2, "amount")?)?,
        },
        "discount" => ShellCommand::OrderDiscount {
            amount: parse_money("order discount", required(args, 0, "amount")?)?,
        },
        "cart" | "c" => ShellCommand::Cart,
        "preview" => ShellCommand::Preview(parse_payment(args)?),
        "pay" => ShellCommand::Pay(parse_payment(args)?),
        "refresh" => ShellCommand::Refresh,
        "clear" | "new" => ShellCommand::Clear,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => {
            return Err(ApiError::validation(format!(
                "Unknown command '{}', type help",
                other
            )))
        }
    };

    Ok(Some(command))
}

// =============================================================================
// Rendering
// =============================================================================

fn render_notifications(out: &mut String, notifications: &[Notification]) {
    for note in notifications {
        let tag = match note.level {
            NotificationLevel::Success => "ok",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        };
        let _ = writeln!(out, "[{}] {}", tag, note.message);
    }
}

fn render_cart(cart: &CartResponse, config: &ConfigState) -> String {
    let mut out = String::new();
    let client = cart
        .client
        .as_ref()
        .map(|c| c.name.as_str())
        .unwrap_or("no client");
    let _ = writeln!(out, "CART ({}) {} line(s)", client, cart.totals.line_count);

    for line in &cart.lines {
        let _ = write!(
            out,
            "  {:<28} {:>8} {:<8} x {:>9} = {:>10}",
            line.product_name(),
            line.quantity().to_string(),
            line.unit_label(),
            config.format_base(line.applied_price()),
            config.format_base(line.subtotal()),
        );
        if line.discount().is_positive() {
            let _ = write!(out, "  (-{})", config.format_base(line.discount()));
        }
        if line.price_fallback() {
            let _ = write!(out, "  [unit price]");
        }
        let _ = writeln!(out, "  max {}", line.available_stock());
    }

    let totals = &cart.totals;
    let _ = writeln!(out, "  subtotal        {}", config.format_base(totals.subtotal));
    if totals.item_discounts.is_positive() {
        let _ = writeln!(out, "  item discounts -{}", config.format_base(totals.item_discounts));
    }
    if totals.order_discount.is_positive() {
        let _ = writeln!(out, "  order discount -{}", config.format_base(totals.order_discount));
    }
    let _ = writeln!(out, "  TOTAL           {}", config.format_base(totals.total));

    render_notifications(&mut out, &cart.notifications);
    out
}

fn render_products(products: &[ProductView], config: &ConfigState) -> String {
    let mut out = String::new();
    if products.is_empty() {
        out.push_str("No products match\n");
    }
    for p in products {
        let _ = write!(
            out,
            "  {:<12} {:<28} {} / {} ({} left)",
            p.id,
            p.name,
            config.format_base(p.unit_price),
            p.unit,
            p.units_available
        );
        if let (Some(price), Some(doses)) = (p.dose_price, p.doses_available) {
            let _ = write!(
                out,
                "  {} / {}{} ({} left)",
                config.format_base(price),
                p.dose_unit,
                if p.dose_price_fallback { "*" } else { "" },
                doses
            );
        }
        out.push('\n');
    }
    out
}

fn render_clients(clients: &[Client], config: &ConfigState) -> String {
    let mut out = String::new();
    for c in clients {
        let _ = writeln!(
            out,
            "  {:<6} {:<28} {:<14} credit {}",
            c.id,
            c.name,
            c.document.as_deref().unwrap_or("-"),
            config.format_base(c.credit_balance)
        );
    }
    out
}

fn render_checkout(response: &CheckoutResponse, config: &ConfigState) -> String {
    let mut out = String::new();
    render_notifications(&mut out, &response.notifications);
    let p = &response.payment;
    let _ = writeln!(out, "  tendered {}", config.format_base(p.tendered));
    if p.change.is_positive() {
        let _ = writeln!(out, "  change   {}", config.format_base(p.change));
    }
    out
}

// =============================================================================
// Shell
// =============================================================================

/// The counter's states, plus the read-eval-print loop over them.
#[derive(Debug, Clone)]
pub struct Shell {
    config: ConfigState,
    backend: BackendState,
    catalog: CatalogState,
    session: SessionState,
}

impl Shell {
    pub fn new(config: ConfigState, backend: BackendState) -> Self {
        Shell {
            config,
            backend,
            catalog: CatalogState::new(),
            session: SessionState::new(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Loads catalog and clients before the first prompt. Failures are
    /// reported and the shell still starts; `refresh` can be retried.
    pub async fn warm_up(&self) -> String {
        let mut out = String::new();
        match catalog::refresh_catalog(&self.backend, &self.catalog, &self.session).await {
            Ok(r) => {
                let _ = writeln!(out, "{} products loaded", r.product_count);
            }
            Err(e) => render_notifications(&mut out, &[Notification::from(&e)]),
        }
        if let Err(e) = catalog::list_clients(&self.backend, &self.catalog, true).await {
            render_notifications(&mut out, &[Notification::from(&e)]);
        }
        out
    }

    /// Runs one command and renders its result.
    pub async fn execute(&self, command: ShellCommand) -> Result<String, ApiError> {
        debug!(?command, "shell command");
        let config = &self.config;

        let output = match command {
            ShellCommand::Products { query } => {
                render_products(&catalog::search_products(&self.catalog, &query)?, config)
            }
            ShellCommand::Clients { refresh } => render_clients(
                &catalog::list_clients(&self.backend, &self.catalog, refresh).await?,
                config,
            ),
            ShellCommand::SelectClient { client_id } => {
                let client = catalog::select_client(&self.catalog, &self.session, &client_id)?;
                format!("Client: {}\n", client.name)
            }
            ShellCommand::ClearClient => {
                catalog::clear_client(&self.session)?;
                "Client cleared\n".to_string()
            }
            ShellCommand::Add { product_id, mode } => render_cart(
                &cart::add_to_cart(&self.catalog, &self.session, &product_id, mode)?,
                config,
            ),
            ShellCommand::Quantity {
                product_id,
                mode,
                quantity,
            } => render_cart(
                &cart::update_quantity(&self.session, &product_id, mode, quantity)?,
                config,
            ),
            ShellCommand::Toggle { product_id, mode } => render_cart(
                &cart::toggle_mode(&self.session, &product_id, mode)?.cart,
                config,
            ),
            ShellCommand::Remove { product_id, mode } => render_cart(
                &cart::remove_from_cart(&self.session, &product_id, mode)?,
                config,
            ),
            ShellCommand::LineDiscount {
                product_id,
                mode,
                amount,
            } => render_cart(
                &cart::set_line_discount(&self.session, &product_id, mode, amount)?,
                config,
            ),
            ShellCommand::OrderDiscount { amount } => {
                render_cart(&cart::set_order_discount(&self.session, amount)?, config)
            }
            ShellCommand::Cart => render_cart(&cart::get_cart(&self.session), config),
            ShellCommand::Preview(payment) => {
                let prepared = sale::preview_checkout(config, &self.session, payment)?;
                let p = &prepared.payment;
                let mut out = format!(
                    "  total {}  tendered {}  remaining {}  change {}\n",
                    config.format_base(p.total),
                    config.format_base(p.tendered),
                    config.format_base(p.remaining),
                    config.format_base(p.change)
                );
                if let Some(note) = Notification::partial_payment(p, config) {
                    render_notifications(&mut out, &[note]);
                }
                out
            }
            ShellCommand::Pay(payment) => render_checkout(
                &sale::checkout(&self.backend, &self.catalog, &self.session, config, payment)
                    .await?,
                config,
            ),
            ShellCommand::Refresh => {
                let response =
                    catalog::refresh_catalog(&self.backend, &self.catalog, &self.session).await?;
                let mut out = format!("{} products loaded\n", response.product_count);
                render_notifications(&mut out, &response.notifications);
                out
            }
            ShellCommand::Clear => render_cart(&cart::clear_cart(&self.session)?, config),
            ShellCommand::Help => format!("{}\n", HELP),
            ShellCommand::Quit => String::new(),
        };

        Ok(output)
    }

    /// Reads commands from `input` until end of input or `quit`.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        output
            .write_all(format!("{}: type help for commands\n", self.config.store_name).as_bytes())
            .await?;
        output.write_all(self.warm_up().await.as_bytes()).await?;

        let mut lines = input.lines();
        loop {
            output.write_all(b"> ").await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let text = match parse_command(&line) {
                Ok(None) => continue,
                Ok(Some(ShellCommand::Quit)) => break,
                Ok(Some(command)) => match self.execute(command).await {
                    Ok(text) => text,
                    Err(e) => format!("[error] {}\n", e.message),
                },
                Err(e) => format!("[error] {}\n", e.message),
            };
            output.write_all(text.as_bytes()).await?;
        }

        output.flush().await
    }
}
