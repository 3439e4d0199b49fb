//! # Seed Data Generator
//!
//! Populates a database with demo clients, users, suppliers and products.
//!
//! ## Usage
//! ```bash
//! # 50 clients, 10 users (default) into the platform data directory
//! cargo run -p softx-db --bin seed
//!
//! # Custom amounts and database file
//! cargo run -p softx-db --bin seed -- --clients 200 --users 20 --db ./softx_dev.db
//! ```
//!
//! ## Generated Data
//! - `Admin Principal` / `admin`: role admin, permission avancado
//! - Remaining users: password `123456`, roles rotating vendedor, financeiro,
//!   estoque, permission padrao
//! - Clients with 11-digit CPFs and unique e-mails
//! - A handful of suppliers, each with products in stock
//!
//! Nothing is written when the database already has users.

use std::env;
use std::path::PathBuf;

use softx_core::{Address, Client, Money, Permission, Product, Supplier, User, UserRole};
use softx_db::{Database, DbConfig, DbError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const ADMIN_NAME: &str = "Admin Principal";
const ADMIN_PASSWORD: &str = "admin";
const DEFAULT_PASSWORD: &str = "123456";

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Carla", "Diego", "Eduarda", "Felipe", "Gabriela", "Henrique", "Isabela",
    "João", "Larissa", "Marcos", "Natália", "Otávio", "Paula", "Rafael", "Sofia", "Tiago",
];

const LAST_NAMES: &[&str] = &[
    "Silva", "Santos", "Oliveira", "Souza", "Lima", "Pereira", "Costa", "Ferreira", "Almeida",
    "Ribeiro", "Carvalho", "Gomes", "Martins", "Rocha",
];

const CITIES: &[(&str, &str)] = &[
    ("São Paulo", "Pinheiros"),
    ("Rio de Janeiro", "Tijuca"),
    ("Belo Horizonte", "Savassi"),
    ("Curitiba", "Batel"),
    ("Porto Alegre", "Moinhos de Vento"),
    ("Recife", "Boa Viagem"),
];

const STREETS: &[&str] = &[
    "Rua das Flores",
    "Avenida Brasil",
    "Rua XV de Novembro",
    "Rua da Consolação",
    "Avenida Paulista",
    "Rua Sete de Setembro",
];

const ROTATING_ROLES: &[UserRole] = &[UserRole::Vendedor, UserRole::Financeiro, UserRole::Estoque];

/// Supplier name and its products: (name, sale price in centavos).
const CATALOG: &[(&str, &[(&str, i64)])] = &[
    (
        "Distribuidora Grão de Ouro",
        &[
            ("Arroz Branco 5kg", 2490),
            ("Feijão Carioca 1kg", 899),
            ("Açúcar Refinado 1kg", 549),
            ("Café Torrado 500g", 1790),
            ("Farinha de Trigo 1kg", 650),
        ],
    ),
    (
        "Laticínios Serra Verde",
        &[
            ("Leite Integral 1L", 549),
            ("Queijo Mussarela 500g", 2890),
            ("Manteiga 200g", 1190),
            ("Iogurte Natural 170g", 349),
        ],
    ),
    (
        "Bebidas Rio Claro",
        &[
            ("Água Mineral 1,5L", 299),
            ("Refrigerante Cola 2L", 899),
            ("Suco de Laranja 1L", 799),
            ("Guaraná 350ml", 449),
        ],
    ),
    (
        "Limpeza Brilho Total",
        &[
            ("Detergente 500ml", 249),
            ("Sabão em Pó 1kg", 1290),
            ("Desinfetante 2L", 990),
        ],
    ),
];

struct Options {
    db_path: Option<PathBuf>,
    clients: usize,
    users: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let Some(options) = parse_args() else {
        return Ok(());
    };

    let config = match &options.db_path {
        Some(path) => DbConfig::new(path),
        None => DbConfig::from_env()?,
    };
    info!(path = %config.database_path.display(), "Seeding database");

    let db = Database::new(config).await?;

    let existing = db.users().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has users, skipping seed");
        return Ok(());
    }

    let users = seed_users(&db, options.users).await?;
    let clients = seed_clients(&db, options.clients).await?;
    let (suppliers, products) = seed_catalog(&db).await?;

    info!(users, clients, suppliers, products, "Seed complete");
    db.close().await;
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,softx=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Returns `None` when only help was requested.
fn parse_args() -> Option<Options> {
    let args: Vec<String> = env::args().collect();

    let mut options = Options {
        db_path: None,
        clients: 50,
        users: 10,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--clients" | "-c" => {
                if i + 1 < args.len() {
                    options.clients = args[i + 1].parse().unwrap_or(options.clients);
                    i += 1;
                }
            }
            "--users" | "-u" => {
                if i + 1 < args.len() {
                    options.users = args[i + 1].parse().unwrap_or(options.users);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    options.db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("SoftX ERP Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --clients <N>  Number of clients (default: 50)");
                println!("  -u, --users <N>    Number of users including admin (default: 10)");
                println!("  -d, --db <PATH>    Database file (default: SOFTX_DB_PATH or data dir)");
                println!("  -h, --help         Show this help message");
                return None;
            }
            other => warn!(argument = other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    Some(options)
}

fn person_name(seed: usize) -> String {
    let first = FIRST_NAMES[seed % FIRST_NAMES.len()];
    let last = LAST_NAMES[(seed / FIRST_NAMES.len() + seed) % LAST_NAMES.len()];
    format!("{first} {last}")
}

fn address(seed: usize) -> Address {
    let (city, district) = CITIES[seed % CITIES.len()];
    Address {
        street: format!("{}, {}", STREETS[seed % STREETS.len()], 10 + seed * 7 % 990),
        postal_code: format!("{:08}", 1_000_000 + seed * 7_919 % 98_000_000),
        district: district.to_string(),
        city: city.to_string(),
    }
}

fn phone(seed: usize) -> String {
    format!("(11) 9{:04}-{:04}", 1000 + seed % 9000, seed * 37 % 10_000)
}

fn birth_date(seed: usize) -> String {
    format!("{:02}/{:02}/{}", 1 + seed % 28, 1 + seed % 12, 1950 + seed % 55)
}

/// Turns a unique-constraint failure into a logged skip.
fn skip_duplicate(result: Result<i64, DbError>, what: &str) -> Result<bool, DbError> {
    match result {
        Ok(_) => Ok(true),
        Err(e) if e.is_unique_violation() => {
            warn!(what, error = %e, "Skipping duplicate");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

async fn seed_users(db: &Database, count: usize) -> Result<usize, DbError> {
    let repo = db.users();

    let admin = User {
        username: ADMIN_NAME.to_string(),
        cpf: "99999999999".to_string(),
        email: "admin@sistema.com".to_string(),
        phone: phone(0),
        birth_date: birth_date(7),
        address: address(0),
        role: UserRole::Admin,
        permission: Permission::Avancado,
        ..User::default()
    };
    let admin_added = skip_duplicate(repo.add(&admin, ADMIN_PASSWORD).await, "user")?;
    let mut added = usize::from(admin_added);

    for n in 1..count.max(1) {
        let user = User {
            username: person_name(n * 5 + 3),
            cpf: format!("{:011}", 20_000_000_000_u64 + n as u64),
            email: format!("usuario{n}@sistema.com"),
            phone: phone(n + 500),
            birth_date: birth_date(n + 11),
            address: address(n + 3),
            role: ROTATING_ROLES[n % ROTATING_ROLES.len()],
            permission: Permission::Padrao,
            ..User::default()
        };
        if skip_duplicate(repo.add(&user, DEFAULT_PASSWORD).await, "user")? {
            added += 1;
        }
    }

    info!(added, "Users created");
    Ok(added)
}

async fn seed_clients(db: &Database, count: usize) -> Result<usize, DbError> {
    let repo = db.clients();
    let mut added = 0;

    for n in 0..count {
        let client = Client {
            id: 0,
            name: person_name(n),
            cpf: format!("{:011}", 10_000_000_000_u64 + n as u64),
            email: format!("cliente{n}@email.com"),
            phone: phone(n),
            birth_date: birth_date(n),
            address: address(n),
        };
        if skip_duplicate(repo.add(&client).await, "client")? {
            added += 1;
        }
    }

    info!(added, "Clients created");
    Ok(added)
}

async fn seed_catalog(db: &Database) -> Result<(usize, usize), DbError> {
    let mut suppliers = 0;
    let mut products = 0;

    for (idx, (supplier_name, items)) in CATALOG.iter().enumerate() {
        let supplier = Supplier {
            id: 0,
            name: supplier_name.to_string(),
            cnpj: format!("{:08}0001{:02}", 11_222_333 + idx, 10 + idx),
            phone: Some(phone(idx + 900)),
            email: Some(format!("contato{idx}@fornecedor.com.br")),
            address: address(idx + 40),
        };
        let supplier_id = db.suppliers().add(&supplier).await?;
        suppliers += 1;

        for (item_idx, (name, price_cents)) in items.iter().enumerate() {
            let product = Product {
                name: name.to_string(),
                description: Some(format!("Fornecido por {supplier_name}")),
                sale_price: Money::from_cents(*price_cents),
                // 60-75% of the sale price
                purchase_price: Money::from_cents(
                    price_cents * (60 + (item_idx as i64 * 5) % 16) / 100,
                ),
                supplier_id: Some(supplier_id),
                ..Product::default()
            };
            let initial_stock = ((idx + 1) * (item_idx + 3) * 7 % 120) as i64;
            db.products().add(&product, initial_stock).await?;
            products += 1;
        }
    }

    info!(suppliers, products, "Catalog created");
    Ok((suppliers, products))
}
