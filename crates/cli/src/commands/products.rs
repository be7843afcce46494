use std::io::{self, Write};

use clap::{Args, Subcommand};
use smarthvac::catalog::{Catalog, Product};

use crate::{
    commands::{load_catalog, write_error},
    config::storage::StorageConfig,
};

#[derive(Debug, Args)]
pub(crate) struct ProductsCommand {
    #[command(subcommand)]
    command: ProductsSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductsSubcommand {
    /// List products, optionally in one category
    List(ListArgs),

    /// Show a product with its features and variants
    Show(ShowArgs),
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Only list products in this category
    #[arg(long)]
    category: Option<String>,
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Product id
    product_id: String,
}

pub(crate) fn run(command: ProductsCommand, storage: &StorageConfig) -> Result<(), String> {
    let catalog = load_catalog(storage)?;
    let mut out = io::stdout().lock();

    let written = match command.command {
        ProductsSubcommand::List(args) => list(&mut out, &catalog, args.category.as_deref()),
        ProductsSubcommand::Show(args) => {
            let product = catalog
                .product(&args.product_id)
                .map_err(|error| format!("{error}"))?;

            show(&mut out, &catalog, product)
        }
    };

    written.map_err(write_error)
}

fn list(out: &mut impl Write, catalog: &Catalog, category: Option<&str>) -> io::Result<()> {
    for category_name in catalog.categories() {
        if category.is_some_and(|wanted| wanted != category_name) {
            continue;
        }

        writeln!(out, "{category_name}")?;

        for product in catalog.in_category(category_name) {
            let stock = if product.in_stock { "" } else { "  (out of stock)" };

            writeln!(
                out,
                "  {:<26} {:<40} {:>12}{stock}",
                product.id,
                product.name,
                catalog.money(product.price).to_string(),
            )?;
        }
    }

    Ok(())
}

fn show(out: &mut impl Write, catalog: &Catalog, product: &Product) -> io::Result<()> {
    writeln!(out, "{} ({})", product.name, product.id)?;
    writeln!(
        out,
        "{}  ·  {:.1}★ from {} reviews  ·  {}",
        catalog.money(product.price),
        product.rating,
        product.review_count,
        if product.in_stock { "in stock" } else { "out of stock" },
    )?;
    writeln!(out, "\n{}", product.description)?;

    if !product.features.is_empty() {
        writeln!(out)?;

        for feature in &product.features {
            writeln!(out, "  • {feature}")?;
        }
    }

    if !product.variants.is_empty() {
        writeln!(out, "\nVariants:")?;

        for variant in &product.variants {
            writeln!(out, "  {:<8} {}", variant.id, variant.name)?;
        }
    }

    Ok(())
}
