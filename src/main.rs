use anyhow::Result;
use chrono::{Duration, Utc};
use tracing_subscriber::EnvFilter;
use tripweave::{ItineraryPlanner, ItineraryRequest, Preference, TripWeaveConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = TripWeaveConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration ({e}), using defaults");
        TripWeaveConfig::default()
    });

    let destination = std::env::args().nth(1).unwrap_or_else(|| "Beijing".to_string());
    let start_date = Utc::now().date_naive() + Duration::days(7);
    let end_date = start_date + Duration::days(2);

    let request = ItineraryRequest::new(
        destination,
        start_date,
        end_date,
        5000.0,
        2,
        vec![Preference::Culture, Preference::Food],
        None,
    )?;

    let planner = ItineraryPlanner::new(config.generative.clone())?;
    if planner.is_degraded() {
        println!("(running without generative credentials, using fallback planning)");
    }

    let itinerary = match planner.plan(&request).await {
        Ok(itinerary) => itinerary,
        Err(e) => {
            let user_message = e
                .downcast_ref::<tripweave::TripWeaveError>()
                .map(tripweave::TripWeaveError::user_message);
            return Err(match user_message {
                Some(message) => anyhow::anyhow!(message),
                None => e,
            });
        }
    };

    println!("{}", itinerary.title);
    println!(
        "{} to {} | budget ¥{} | estimated ¥{}",
        itinerary.start_date, itinerary.end_date, itinerary.budget, itinerary.estimated_cost
    );
    for day in &itinerary.days {
        println!("\nDay {} ({})", day.day, day.date);
        for activity in &day.activities {
            println!("  {} {} @ {}", activity.time, activity.title, activity.location);
        }
    }

    Ok(())
}
