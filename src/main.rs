use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgAction, Parser};
use serde::Serialize;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use tripr::config::Settings;
use tripr::error::TripError;
use tripr::fetch::{ApiClient, Transport};
use tripr::itinerary::{AddOutcome, Itinerary};
use tripr::lookup::{LocationProvider, LookupOutcome, LookupService};
use tripr::model::SearchResults;
use tripr::notify::ConsoleNotifier;
use tripr::query::{
    ActivitySearchParams, ActivitySort, CabinClass, FlightSearchParams, FlightSort,
    HotelSearchParams, Stops,
};
use tripr::route::{Domain, SearchRoute};
use tripr::storage::FileStore;
use tripr::table;
use tripr::watch::watch_lines;

#[derive(Parser)]
#[command(
    name = "tripr",
    about = "Plan trips from the terminal: flights, hotels, activities and an itinerary",
    version,
    after_help = "\
Examples:
  tripr flights lookup \"new york\"
  tripr flights search -f JFK.AIRPORT -t LHR.AIRPORT -d 2026-04-01
  tripr hotels lookup lisbon
  tripr hotels search --dest-id -2167973 --arrival-date 2026-04-01 --departure-date 2026-04-05 --add 1
  tripr activities search --id eyJ1ZmkiOi0yMTY3OTczfQ== --top 5
  tripr itinerary list

Set RAPIDAPI_KEY to a key subscribed to the booking-com15 API."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct GlobalArgs {
    #[arg(
        long,
        global = true,
        env = "RAPIDAPI_KEY",
        hide_env_values = true,
        value_name = "KEY",
        help = "RapidAPI key for the booking-com15 API"
    )]
    api_key: Option<String>,

    #[arg(
        long,
        global = true,
        env = "TRIPR_API_BASE",
        value_name = "URL",
        help = "Override the travel API base URL"
    )]
    api_base: Option<String>,

    #[arg(
        long,
        global = true,
        env = "TRIPR_DATA_DIR",
        value_name = "DIR",
        help = "Directory holding the saved itinerary"
    )]
    data_dir: Option<PathBuf>,

    #[arg(long, global = true, value_name = "URL", help = "HTTP or SOCKS5 proxy")]
    proxy: Option<String>,

    #[arg(
        long,
        global = true,
        default_value = "30",
        value_name = "SECS",
        help = "Request timeout"
    )]
    timeout: u64,

    #[arg(
        short,
        long,
        global = true,
        action = ArgAction::Count,
        help = "More log output on stderr (repeat for more)"
    )]
    verbose: u8,

    #[arg(short, long, global = true, help = "Suppress itinerary notifications")]
    quiet: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    #[command(about = "Look up flight destinations and search flights")]
    Flights {
        #[command(subcommand)]
        command: FlightsCommand,
    },
    #[command(about = "Look up hotel destinations and search hotels")]
    Hotels {
        #[command(subcommand)]
        command: HotelsCommand,
    },
    #[command(about = "Look up attraction locations and search activities")]
    Activities {
        #[command(subcommand)]
        command: ActivitiesCommand,
    },
    #[command(
        about = "Run the search described by a results route",
        after_help = "\
Examples:
  tripr results \"/flights/results?fromId=JFK.AIRPORT&toId=LHR.AIRPORT&departDate=2026-04-01\"
  tripr results \"/activities/results?id=eyJ1ZmkiOi0yMTY3OTczfQ%3D%3D&sortBy=lowest_price\""
    )]
    Results(ResultsArgs),
    #[command(about = "Show or edit the saved itinerary")]
    Itinerary {
        #[command(subcommand)]
        command: ItineraryCommand,
    },
    #[command(about = "Start MCP server for AI agents (stdio transport)")]
    Mcp,
}

#[derive(clap::Subcommand)]
enum FlightsCommand {
    #[command(about = "Find airports and cities matching a query")]
    Lookup(LookupArgs),
    #[command(about = "Look up every line read from stdin, newest query wins")]
    Watch(WatchArgs),
    #[command(about = "Search flights between two destinations")]
    Search(FlightSearchArgs),
}

#[derive(clap::Subcommand)]
enum HotelsCommand {
    #[command(about = "Find hotel destinations matching a query")]
    Lookup(LookupArgs),
    #[command(about = "Look up every line read from stdin, newest query wins")]
    Watch(WatchArgs),
    #[command(about = "Search hotels at a destination")]
    Search(HotelSearchArgs),
}

#[derive(clap::Subcommand)]
enum ActivitiesCommand {
    #[command(about = "Find attraction locations matching a query")]
    Lookup(LookupArgs),
    #[command(about = "Look up every line read from stdin, newest query wins")]
    Watch(WatchArgs),
    #[command(about = "Search activities at a location")]
    Search(ActivitySearchArgs),
}

#[derive(clap::Subcommand)]
enum ItineraryCommand {
    #[command(about = "List saved items")]
    List {
        #[arg(long, help = "Output as JSON")]
        json: bool,
        #[arg(long, help = "Output as pretty-printed JSON")]
        pretty: bool,
    },
    #[command(about = "Remove one item by id")]
    Remove {
        #[arg(value_name = "ID", help = "Item id as shown by `tripr itinerary list`")]
        id: String,
        #[arg(short, long, help = "Do not ask for confirmation")]
        yes: bool,
    },
    #[command(about = "Remove every item")]
    Clear {
        #[arg(short, long, help = "Do not ask for confirmation")]
        yes: bool,
    },
}

#[derive(clap::Args)]
struct LookupArgs {
    #[arg(value_name = "QUERY", help = "City, airport or region name (at least 3 characters)")]
    query: String,

    #[arg(long, help = "Output as JSON")]
    json: bool,

    #[arg(long, help = "Output as pretty-printed JSON")]
    pretty: bool,
}

#[derive(clap::Args)]
struct WatchArgs {
    #[arg(
        long,
        default_value = "300",
        value_name = "MS",
        help = "Quiet period before a line is looked up"
    )]
    debounce_ms: u64,

    #[arg(long, help = "Output one JSON object per line")]
    json: bool,
}

#[derive(clap::Args)]
struct OutputArgs {
    #[arg(long, value_name = "N", help = "Show only the N cheapest results")]
    top: Option<usize>,

    #[arg(long, value_name = "N", help = "Add result number N to the itinerary")]
    add: Option<usize>,

    #[arg(long, help = "Output as JSON")]
    json: bool,

    #[arg(long, help = "Output as pretty-printed JSON")]
    pretty: bool,
}

#[derive(clap::Args)]
struct FlightSearchArgs {
    #[arg(short, long, value_name = "ID", help = "Origin id from `tripr flights lookup` (e.g. JFK.AIRPORT)")]
    from_id: Option<String>,

    #[arg(short, long, value_name = "ID", help = "Destination id from `tripr flights lookup`")]
    to_id: Option<String>,

    #[arg(short = 'd', long, value_name = "YYYY-MM-DD", help = "Departure date")]
    depart_date: Option<String>,

    #[arg(long, value_name = "YYYY-MM-DD", help = "Return date")]
    return_date: Option<String>,

    #[arg(long, default_value = "none", value_name = "N", help = "Maximum stops [none, 0, 1, 2]")]
    stops: String,

    #[arg(long, default_value = "1", value_name = "N", help = "Result page")]
    page: u32,

    #[arg(long, default_value = "1", value_name = "N", help = "Number of adult passengers")]
    adults: u32,

    #[arg(long, value_name = "AGES", help = "Child ages, comma-separated (e.g. 4,9)")]
    children: Option<String>,

    #[arg(long, default_value = "BEST", value_name = "ORDER", help = "Sort order [BEST, CHEAPEST, FASTEST]")]
    sort: String,

    #[arg(
        long,
        default_value = "ECONOMY",
        value_name = "CLASS",
        help = "Cabin class [ECONOMY, PREMIUM_ECONOMY, BUSINESS, FIRST]"
    )]
    cabin_class: String,

    #[arg(long, default_value = "USD", value_name = "CODE", help = "Currency code")]
    currency: String,

    #[arg(long, help = "Print the results route instead of searching")]
    url: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(clap::Args)]
struct HotelSearchArgs {
    #[arg(
        long,
        allow_hyphen_values = true,
        value_name = "ID",
        help = "Destination id from `tripr hotels lookup` (often negative)"
    )]
    dest_id: Option<String>,

    #[arg(long, default_value = "city", value_name = "TYPE", help = "Destination search type (the lookup Code column)")]
    search_type: String,

    #[arg(long, value_name = "YYYY-MM-DD", help = "Check-in date")]
    arrival_date: Option<String>,

    #[arg(long, value_name = "YYYY-MM-DD", help = "Check-out date")]
    departure_date: Option<String>,

    #[arg(long, default_value = "1", value_name = "N", help = "Number of adults")]
    adults: u32,

    #[arg(long, value_name = "AGES", help = "Child ages, comma-separated")]
    children_age: Option<String>,

    #[arg(long, default_value = "1", value_name = "N", help = "Number of rooms")]
    rooms: u32,

    #[arg(long, default_value = "1", value_name = "N", help = "Result page")]
    page: u32,

    #[arg(long, value_name = "AMOUNT", help = "Minimum price per stay")]
    price_min: Option<u32>,

    #[arg(long, value_name = "AMOUNT", help = "Maximum price per stay")]
    price_max: Option<u32>,

    #[arg(long, value_name = "ORDER", help = "Provider sort id")]
    sort_by: Option<String>,

    #[arg(long, value_name = "FILTER", help = "Provider category filter")]
    categories: Option<String>,

    #[arg(long, default_value = "metric", value_name = "UNITS", help = "Distance units [metric, imperial]")]
    units: String,

    #[arg(long, default_value = "c", value_name = "UNIT", help = "Temperature unit [c, f]")]
    temperature_unit: String,

    #[arg(long, default_value = "en-us", value_name = "CODE", help = "Language code")]
    lang: String,

    #[arg(long, default_value = "USD", value_name = "CODE", help = "Currency code")]
    currency: String,

    #[arg(long, default_value = "US", value_name = "CC", help = "Searcher country code")]
    location: String,

    #[arg(long, help = "Print the results route instead of searching")]
    url: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(clap::Args)]
struct ActivitySearchArgs {
    #[arg(long, value_name = "ID", help = "Location id from `tripr activities lookup`")]
    id: Option<String>,

    #[arg(long, value_name = "YYYY-MM-DD", help = "First day")]
    start_date: Option<String>,

    #[arg(long, value_name = "YYYY-MM-DD", help = "Last day")]
    end_date: Option<String>,

    #[arg(
        long,
        default_value = "trending",
        value_name = "ORDER",
        help = "Sort order [trending, attr_book_score, lowest_price]"
    )]
    sort_by: String,

    #[arg(long, default_value = "1", value_name = "N", help = "Result page")]
    page: u32,

    #[arg(long, default_value = "USD", value_name = "CODE", help = "Currency code")]
    currency: String,

    #[arg(long, default_value = "en-us", value_name = "CODE", help = "Language code")]
    lang: String,

    #[arg(long, help = "Print the results route instead of searching")]
    url: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(clap::Args)]
struct ResultsArgs {
    #[arg(value_name = "ROUTE", help = "Results route printed by `search --url`")]
    route: String,

    #[command(flatten)]
    output: OutputArgs,
}

fn error_code(err: &TripError) -> i32 {
    match err {
        TripError::MissingParams(_)
        | TripError::InvalidDate(_)
        | TripError::InvalidRoute(_)
        | TripError::MissingApiKey
        | TripError::Validation(_) => 2,
        TripError::Timeout
        | TripError::ConnectionFailed(_)
        | TripError::DnsResolution(_)
        | TripError::TlsError(_)
        | TripError::ProxyError(_) => 3,
        TripError::RateLimited | TripError::Unauthorized(_) => 4,
        TripError::HttpStatus(_) | TripError::ProviderRejected(_) => 5,
        TripError::Decode(_) => 6,
        TripError::Storage(_) => 7,
    }
}

fn error_kind(err: &TripError) -> &'static str {
    match err {
        TripError::MissingParams(_) => "missing_parameters",
        TripError::InvalidDate(_) => "invalid_date",
        TripError::InvalidRoute(_) => "invalid_route",
        TripError::MissingApiKey => "missing_api_key",
        TripError::Validation(_) => "validation_error",
        TripError::Timeout => "timeout",
        TripError::ConnectionFailed(_) => "connection_failed",
        TripError::DnsResolution(_) => "dns_error",
        TripError::TlsError(_) => "tls_error",
        TripError::ProxyError(_) => "proxy_error",
        TripError::RateLimited => "rate_limited",
        TripError::Unauthorized(_) => "unauthorized",
        TripError::HttpStatus(_) => "http_error",
        TripError::ProviderRejected(_) => "provider_error",
        TripError::Decode(_) => "parse_error",
        TripError::Storage(_) => "storage_error",
    }
}

fn die(err: &TripError, json_mode: bool) -> ! {
    if json_mode {
        let json = serde_json::json!({
            "error": {
                "kind": error_kind(err),
                "message": err.to_string(),
            }
        });
        println!("{json}");
    } else {
        eprintln!("error: {err}");
    }
    process::exit(error_code(err));
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) {
    let output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match output {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("error: failed to serialize output: {e}"),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,tripr={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn settings(global: &GlobalArgs) -> Settings {
    Settings {
        api_key: global.api_key.clone(),
        api_base: global.api_base.clone(),
        data_dir: global.data_dir.clone(),
        proxy: global.proxy.clone(),
        timeout: global.timeout,
    }
}

fn open_itinerary(settings: &Settings, quiet: bool) -> Itinerary {
    let dir = settings.data_dir();
    tracing::debug!(dir = %dir.display(), "opening itinerary storage");
    Itinerary::load(
        Arc::new(FileStore::new(dir)),
        Arc::new(ConsoleNotifier { quiet }),
    )
}

fn api_client(settings: &Settings, json_mode: bool) -> Arc<dyn Transport> {
    match ApiClient::new(&settings.fetch_options()) {
        Ok(client) => Arc::new(client),
        Err(e) => die(&e, json_mode),
    }
}

fn confirm(prompt: &str) -> bool {
    eprint!("{prompt} [y/N] ");
    let _ = io::stderr().flush();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn or_die<T>(result: Result<T, TripError>, json_mode: bool) -> T {
    match result {
        Ok(v) => v,
        Err(e) => die(&e, json_mode),
    }
}

fn flight_route(args: &FlightSearchArgs, json_mode: bool) -> SearchRoute {
    let mut p = FlightSearchParams::new(
        args.from_id.as_deref().unwrap_or_default(),
        args.to_id.as_deref().unwrap_or_default(),
        args.depart_date.as_deref().unwrap_or_default(),
    );
    p.return_date = args.return_date.clone();
    p.stops = or_die(Stops::from_str_loose(&args.stops), json_mode);
    p.page_no = args.page;
    p.adults = args.adults;
    p.children = args.children.clone();
    p.sort = or_die(FlightSort::from_str_loose(&args.sort), json_mode);
    p.cabin_class = or_die(CabinClass::from_str_loose(&args.cabin_class), json_mode);
    p.currency = args.currency.to_uppercase();
    SearchRoute::Flights(p)
}

fn hotel_route(args: &HotelSearchArgs) -> SearchRoute {
    let mut p = HotelSearchParams::new(
        args.dest_id.as_deref().unwrap_or_default(),
        &args.search_type,
        args.arrival_date.as_deref().unwrap_or_default(),
        args.departure_date.as_deref().unwrap_or_default(),
    );
    p.adults = args.adults;
    p.children_age = args.children_age.clone();
    p.room_qty = args.rooms;
    p.page_number = args.page;
    p.price_min = args.price_min;
    p.price_max = args.price_max;
    p.sort_by = args.sort_by.clone();
    p.categories_filter = args.categories.clone();
    p.units = args.units.clone();
    p.temperature_unit = args.temperature_unit.clone();
    p.language = args.lang.clone();
    p.currency = args.currency.to_uppercase();
    p.location = args.location.clone();
    SearchRoute::Hotels(p)
}

fn activity_route(args: &ActivitySearchArgs, json_mode: bool) -> SearchRoute {
    let mut p = ActivitySearchParams::new(args.id.as_deref().unwrap_or_default());
    p.start_date = args.start_date.clone();
    p.end_date = args.end_date.clone();
    p.sort_by = or_die(ActivitySort::from_str_loose(&args.sort_by), json_mode);
    p.page = args.page;
    p.currency = args.currency.to_uppercase();
    p.language = args.lang.clone();
    SearchRoute::Activities(p)
}

fn empty_message(results: &SearchResults) -> &'static str {
    match results {
        SearchResults::Flights(_) => "No flights found.",
        SearchResults::Hotels(_) => "No hotels found.",
        SearchResults::Activities(_) => "No activities found.",
    }
}

async fn run_search(route: SearchRoute, print_url: bool, output: &OutputArgs, global: &GlobalArgs) {
    let json_mode = output.json || output.pretty;

    if let Err(e) = route.validate() {
        die(&e, json_mode);
    }

    if print_url {
        println!("{}", route.to_url());
        return;
    }

    let settings = settings(global);
    let client = api_client(&settings, json_mode);

    let mut results = match tripr::search(client.as_ref(), &route).await {
        Ok(r) => r,
        Err(e) => die(&e, json_mode),
    };

    if let Some(n) = output.top {
        results.apply_top(n);
    }

    let mut itinerary = open_itinerary(&settings, global.quiet);

    if json_mode {
        print_json(&results, output.pretty);
    } else if results.is_empty() {
        println!("{}", empty_message(&results));
    } else {
        println!("{}", table::render_results(&results, Some(&itinerary)));
    }

    if let Some(position) = output.add {
        let Some(payload) = results.payload(position) else {
            die(
                &TripError::Validation(format!(
                    "--add {position} is out of range ({} results)",
                    results.len()
                )),
                json_mode,
            );
        };
        if let AddOutcome::Added { id } = itinerary.add_payload(payload) {
            tracing::info!(%id, "added to itinerary");
        }
    }
}

fn report_lookup(query: &str, outcome: &LookupOutcome, json_mode: bool) {
    match outcome {
        LookupOutcome::Cancelled => {}
        LookupOutcome::Failed(e) => {
            if json_mode {
                let line = serde_json::json!({
                    "query": query,
                    "error": { "kind": error_kind(e), "message": e.to_string() },
                });
                println!("{line}");
            } else {
                eprintln!("error: {query}: {e}");
            }
        }
        LookupOutcome::Empty | LookupOutcome::Results(_) => {
            if json_mode {
                let line = serde_json::json!({ "query": query, "results": outcome.records() });
                println!("{line}");
            } else if outcome.records().is_empty() {
                println!("No locations found for \"{query}\".");
            } else {
                println!("=== {query} ===");
                println!("{}", table::render_locations(outcome.records()));
            }
        }
    }
}

async fn run_lookup(domain: Domain, args: &LookupArgs, global: &GlobalArgs) {
    let json_mode = args.json || args.pretty;
    let settings = settings(global);
    let service = LookupService::new(
        LocationProvider::for_domain(domain),
        api_client(&settings, json_mode),
    );

    match service.lookup(&args.query).await {
        LookupOutcome::Failed(e) => die(&e, json_mode),
        outcome => {
            if json_mode {
                print_json(outcome.records(), args.pretty);
            } else if outcome.records().is_empty() {
                println!("No locations found.");
            } else {
                println!("{}", table::render_locations(outcome.records()));
            }
        }
    }
}

async fn run_watch(domain: Domain, args: &WatchArgs, global: &GlobalArgs) {
    let settings = settings(global);
    let service = Arc::new(LookupService::new(
        LocationProvider::for_domain(domain),
        api_client(&settings, args.json),
    ));

    watch_lines(
        service,
        BufReader::new(tokio::io::stdin()),
        Duration::from_millis(args.debounce_ms),
        |query, outcome| report_lookup(query, outcome, args.json),
    )
    .await;
}

fn run_itinerary(command: ItineraryCommand, global: &GlobalArgs) {
    let settings = settings(global);
    let mut itinerary = open_itinerary(&settings, global.quiet);

    match command {
        ItineraryCommand::List { json, pretty } => {
            if json || pretty {
                print_json(itinerary.list(), pretty);
            } else if itinerary.is_empty() {
                println!("Your itinerary is empty.");
            } else {
                println!("{}", table::render_itinerary(itinerary.list()));
                let totals: Vec<String> = table::totals(itinerary.list())
                    .iter()
                    .map(table::format_price)
                    .collect();
                println!(
                    "{} item{} • total {}",
                    itinerary.len(),
                    if itinerary.len() == 1 { "" } else { "s" },
                    totals.join(" + ")
                );
            }
        }
        ItineraryCommand::Remove { id, yes } => {
            let Some(entry) = itinerary.get(&id) else {
                itinerary.remove(&id);
                eprintln!("No itinerary item with id {id}.");
                return;
            };
            let prompt = format!("Remove {} \"{}\"?", entry.kind(), entry.payload.label());
            if !yes && !confirm(&prompt) {
                eprintln!("Aborted.");
                return;
            }
            itinerary.remove(&id);
        }
        ItineraryCommand::Clear { yes } => {
            if !yes && !confirm(&format!("Remove all {} items?", itinerary.len())) {
                eprintln!("Aborted.");
                return;
            }
            itinerary.clear();
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);
    let global = &cli.global;

    match cli.command {
        Commands::Mcp => tripr::mcp::run(settings(global)).await,
        Commands::Flights { command } => match command {
            FlightsCommand::Lookup(args) => run_lookup(Domain::Flights, &args, global).await,
            FlightsCommand::Watch(args) => run_watch(Domain::Flights, &args, global).await,
            FlightsCommand::Search(args) => {
                let json_mode = args.output.json || args.output.pretty;
                let route = flight_route(&args, json_mode);
                run_search(route, args.url, &args.output, global).await
            }
        },
        Commands::Hotels { command } => match command {
            HotelsCommand::Lookup(args) => run_lookup(Domain::Hotels, &args, global).await,
            HotelsCommand::Watch(args) => run_watch(Domain::Hotels, &args, global).await,
            HotelsCommand::Search(args) => {
                let route = hotel_route(&args);
                run_search(route, args.url, &args.output, global).await
            }
        },
        Commands::Activities { command } => match command {
            ActivitiesCommand::Lookup(args) => {
                run_lookup(Domain::Activities, &args, global).await
            }
            ActivitiesCommand::Watch(args) => run_watch(Domain::Activities, &args, global).await,
            ActivitiesCommand::Search(args) => {
                let json_mode = args.output.json || args.output.pretty;
                let route = activity_route(&args, json_mode);
                run_search(route, args.url, &args.output, global).await
            }
        },
        Commands::Results(args) => {
            let json_mode = args.output.json || args.output.pretty;
            let route = or_die(SearchRoute::parse(&args.route), json_mode);
            run_search(route, false, &args.output, global).await
        }
        Commands::Itinerary { command } => run_itinerary(command, global),
    }
}
