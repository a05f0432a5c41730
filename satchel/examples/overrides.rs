use satchel::{Args, Container, Injector};

fn render(args: Args) -> satchel::Result<String> {
  let url = args.get::<String>("url")?;
  let retries = args.get::<u32>("retries")?;
  Ok(format!("{} (retries: {})", url, retries))
}

fn main() -> satchel::Result<()> {
  // The injection point is declared before any container exists.
  let report = satchel::bind(render)
    .pass_as("database_url", "url")
    .pass("retries");

  // --- Production wiring ---
  let production = Container::named("production");
  production.put_value("database_url", String::from("postgres://db.internal/app"))?;
  production.put_value("retries", 3_u32)?;
  let _app = satchel::scoped(&production, false);

  println!("Production: {}", report.call(Args::new())?);
  assert_eq!(report.call(Args::new())?, "postgres://db.internal/app (retries: 3)");

  // --- A test overriding a single dependency ---
  // Chaining keeps everything the override doesn't mention.
  {
    let overrides = Container::named("test");
    overrides.put_value("database_url", String::from("sqlite::memory:"))?;
    let _test = satchel::scoped(&overrides, true);

    println!("Under test: {}", report.call(Args::new())?);
    assert_eq!(report.call(Args::new())?, "sqlite::memory: (retries: 3)");
  }

  // --- Explicit arguments always win ---
  let explicit = report.call(Args::new().with("retries", 0_u32))?;
  println!("Explicit:   {}", explicit);
  assert_eq!(explicit, "postgres://db.internal/app (retries: 0)");

  Ok(())
}
