//! `SportSphere` Shop CLI

use std::{
    future,
    io::{self, Write},
    process::ExitCode,
};

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::error;

use sportsphere_shop::{
    cart::{CartEngine, CartError, LineKey, snapshot::FileSnapshotStore},
    catalog::{Catalog, CatalogError},
    checkout::{Checkout, CheckoutError},
    config::ShopConfig,
    history::InMemoryPurchaseHistory,
    observability::{self, ObservabilityError},
    payments::{CardDetails, MOBILE_MONEY_PROVIDERS, PaymentError, PaymentMethod},
    products::ProductType,
    quotes::{OrderPricer, PricingError, ShippingOption},
    render::RenderError,
    variants::VariantSelection,
};

#[derive(Debug, Parser)]
#[command(name = "sportsphere-shop", about = "SportSphere shop cart and checkout", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ShopConfig,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List catalog products
    Catalog(CatalogArgs),

    /// Add a product to the cart
    Add(AddArgs),

    /// Change a cart line's quantity by a signed amount
    Update {
        /// Line key, as shown by `cart`
        key: String,

        /// Amount to add; zero or less in total removes the line
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },

    /// Remove a cart line
    Remove {
        /// Line key, as shown by `cart`
        key: String,
    },

    /// Show the cart
    Cart,

    /// Empty the cart
    Clear,

    /// Price the cart with shipping and insurance
    Quote(QuoteArgs),

    /// Pay for the cart and place an order
    Checkout(CheckoutArgs),
}

#[derive(Debug, Args)]
struct CatalogArgs {
    /// Only list one product family
    #[arg(long = "type", value_enum)]
    product_type: Option<ProductTypeArg>,

    /// Only list products whose name contains this text
    #[arg(long)]
    search: Option<String>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum ProductTypeArg {
    Merchandise,
    Ticket,
    Membership,
    Hardware,
    Subscription,
    Offer,
}

impl From<ProductTypeArg> for ProductType {
    fn from(arg: ProductTypeArg) -> Self {
        match arg {
            ProductTypeArg::Merchandise => Self::Merchandise,
            ProductTypeArg::Ticket => Self::Ticket,
            ProductTypeArg::Membership => Self::Membership,
            ProductTypeArg::Hardware => Self::Hardware,
            ProductTypeArg::Subscription => Self::Subscription,
            ProductTypeArg::Offer => Self::Offer,
        }
    }
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Product id
    product: String,

    /// Merchandise color
    #[arg(long)]
    color: Option<String>,

    /// Merchandise size
    #[arg(long)]
    size: Option<String>,

    /// Ticket class
    #[arg(long)]
    ticket_class: Option<String>,

    /// Membership tier
    #[arg(long)]
    tier: Option<String>,

    /// Number of units
    #[arg(short, long, default_value_t = 1)]
    quantity: u32,
}

impl AddArgs {
    fn selection(&self) -> VariantSelection {
        VariantSelection {
            color: self.color.clone(),
            size: self.size.clone(),
            ticket_class: self.ticket_class.clone(),
            tier: self.tier.clone(),
        }
    }
}

#[derive(Debug, Args)]
struct QuoteArgs {
    /// Shipping option (standard, express)
    #[arg(long, default_value_t = ShippingOption::Standard)]
    shipping: ShippingOption,

    /// Add shipping insurance
    #[arg(long)]
    insured: bool,
}

#[derive(Debug, Args)]
struct CheckoutArgs {
    #[command(flatten)]
    quote: QuoteArgs,

    /// Card number
    #[arg(long, conflicts_with = "mobile_provider")]
    card_number: Option<String>,

    /// Cardholder name
    #[arg(long, default_value = "")]
    card_holder: String,

    /// Card expiry (MM/YY)
    #[arg(long, default_value = "")]
    card_expiry: String,

    /// Card security code
    #[arg(long, default_value = "")]
    card_cvv: String,

    /// Mobile money provider (M-Pesa, Tigo Pesa, Airtel Money)
    #[arg(long, value_parser = MOBILE_MONEY_PROVIDERS)]
    mobile_provider: Option<String>,

    /// Mobile money number
    #[arg(long, default_value = "")]
    mobile_number: String,
}

impl CheckoutArgs {
    fn payment_method(&self) -> PaymentMethod {
        match &self.mobile_provider {
            Some(provider) => PaymentMethod::MobileMoney {
                provider: provider.clone(),
                number: self.mobile_number.clone(),
            },
            None => PaymentMethod::Card(CardDetails {
                number: self.card_number.clone().unwrap_or_default(),
                holder: self.card_holder.clone(),
                expiry: self.card_expiry.clone(),
                cvv: self.card_cvv.clone(),
            }),
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Observability(#[from] ObservabilityError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::load() {
        Ok(cli) => cli,
        Err(parse_error) => {
            _ = parse_error.print();

            return ExitCode::from(u8::try_from(parse_error.exit_code()).unwrap_or(2));
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(run_error) => {
            error!(error = %run_error, "command failed");

            #[expect(
                clippy::print_stderr,
                reason = "command errors are reported to the shopper even when logging is off"
            )]
            {
                eprintln!("Error: {run_error}");
            }

            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    observability::init_subscriber(&cli.config.logging)?;

    let catalog = cli.config.store.catalog()?;
    let mut engine = CartEngine::restore(catalog.currency(), cli.config.store.snapshot_store());
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Catalog(args) => list_catalog(&mut out, &catalog, &args)?,
        Command::Add(args) => {
            let product = catalog.get(&args.product)?;
            let key = engine.add_item(product, &args.selection(), args.quantity)?;

            writeln!(out, "Added {} x {} ({key})", args.quantity, product.name)?;
            engine.cart().write_to(&mut out)?;
        }
        Command::Update { key, delta } => {
            let key = LineKey::from(key);

            match engine.update_quantity(&key, delta)? {
                Some(quantity) => writeln!(out, "{key} quantity is now {quantity}")?,
                None => writeln!(out, "Removed {key}")?,
            }

            engine.cart().write_to(&mut out)?;
        }
        Command::Remove { key } => {
            let removed = engine.remove_item(&LineKey::from(key))?;

            writeln!(out, "Removed {}", removed.name())?;
            engine.cart().write_to(&mut out)?;
        }
        Command::Cart => engine.cart().write_to(&mut out)?,
        Command::Clear => {
            engine.clear();

            writeln!(out, "Cart cleared.")?;
        }
        Command::Quote(args) => {
            let pricer = OrderPricer::default();

            engine.cart().write_to(&mut out)?;
            pricer
                .quote(engine.subtotal().map_err(CartError::from)?, args.shipping, args.insured)?
                .write_to(&mut out)?;
        }
        Command::Checkout(args) => checkout(&mut out, &cli.config, &mut engine, &args).await?,
    }

    if let Some(persist_error) = engine.last_persist_error() {
        writeln!(out, "Warning: cart could not be saved: {persist_error}")?;
    }

    Ok(())
}

fn list_catalog(out: &mut impl Write, catalog: &Catalog, args: &CatalogArgs) -> Result<(), CliError> {
    let products = catalog.filter(args.product_type.map(ProductType::from), args.search.as_deref());

    Catalog::write_to(out, products)?;

    Ok(())
}

async fn checkout(
    out: &mut impl Write,
    config: &ShopConfig,
    engine: &mut CartEngine<FileSnapshotStore>,
    args: &CheckoutArgs,
) -> Result<(), CliError> {
    let mut checkout = Checkout::new(
        OrderPricer::default(),
        config.payment.gateway()?,
        InMemoryPurchaseHistory::new(),
    );

    let quote = checkout.quote(engine, args.quote.shipping, args.quote.insured)?;

    quote.write_to(&mut *out)?;

    let abandon = async {
        if tokio::signal::ctrl_c().await.is_err() {
            future::pending::<()>().await;
        }
    };

    let order = checkout
        .finalize_order_or_abandon(engine, &quote, &args.payment_method(), abandon)
        .await?;

    writeln!(out, "Payment successful! Your order has been placed.")?;
    order.write_to(&mut *out)?;

    Ok(())
}
