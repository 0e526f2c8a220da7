use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bloodbridge_gazetteer::{DistrictSearch, Gazetteer, MatchOutcome, Matcher, RawAddress};
use bloodbridge_geo::{
    AutofillUpdate, Coordinates, CoordinateAutofill, GeoConfig, GeocoderChain,
    GeolocationAcquirer, IpPositionSource, LocationResolver,
};
use bloodbridge_profile::validation::{
    parse_dob, validate_dob, validate_location, validate_phone,
};
use bloodbridge_profile::{
    BloodGroup, Field, FieldErrors, Gender, ProfileClient, ProfileError, ProfileFormHost,
    ProfileWizard, Step, SubmitMode, ValidationError,
};
use chrono::NaiveDate;
use clap::Args;
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::interactive;
use crate::output::Response;

#[derive(Args, Debug)]
pub struct DistrictsArgs {
    /// State name; alternate spellings are accepted
    pub state: String,

    /// Type-ahead query ranked with fuzzy matching
    #[arg(long)]
    pub query: Option<String>,

    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

#[derive(Args, Debug)]
pub struct MatchArgs {
    #[arg(long)]
    pub state: Option<String>,

    #[arg(long)]
    pub district: Option<String>,

    #[arg(long)]
    pub city: Option<String>,
}

#[derive(Args, Debug)]
pub struct LocateArgs {
    /// Latitude; skips position acquisition when given with --lon
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

#[derive(Args, Debug)]
pub struct GeocodeArgs {
    /// Free-text place, e.g. "Kochi, Ernakulam, Kerala, India"
    pub query: String,
}

#[derive(Args, Debug, Default)]
pub struct FieldArgs {
    #[arg(long)]
    pub gender: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    /// Date of birth, YYYY-MM-DD
    #[arg(long)]
    pub dob: Option<String>,

    #[arg(long = "blood-group")]
    pub blood_group: Option<String>,

    #[arg(long)]
    pub state: Option<String>,

    #[arg(long)]
    pub district: Option<String>,

    #[arg(long)]
    pub city: Option<String>,
}

#[derive(Args, Debug)]
pub struct CompleteProfileArgs {
    /// Edit an existing profile (PUT) instead of first completion (POST)
    #[arg(long)]
    pub update: bool,

    /// Prompt for every field
    #[arg(long)]
    pub interactive: bool,

    /// Resolve the location from the current position first
    #[arg(long)]
    pub use_location: bool,

    #[command(flatten)]
    pub fields: FieldArgs,
}

fn gazetteer() -> Result<&'static Gazetteer> {
    Gazetteer::india().context("Failed to load gazetteer")
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn states() -> Result<Response> {
    let gazetteer = gazetteer()?;
    let states: Vec<Value> = gazetteer
        .entries()
        .iter()
        .map(|e| json!({ "name": e.name, "districts": e.districts.len() }))
        .collect();
    Ok(Response::ok(
        json!({ "count": states.len(), "states": states }),
        None,
    ))
}

pub fn districts(args: DistrictsArgs, config: &AppConfig) -> Result<Response> {
    let gazetteer = gazetteer()?;
    let outcome = Matcher::new(gazetteer)
        .with_similarity_threshold(config.geo.similarity_threshold)
        .match_state(&args.state);
    let state = outcome
        .value()
        .ok_or_else(|| ValidationError::UnknownState(args.state.clone()))?
        .to_string();

    // Without a query the picker shows every district.
    let limit = if args.query.is_some() {
        args.limit
    } else {
        usize::MAX
    };
    let query = args.query.as_deref().unwrap_or_default();
    let suggestions = DistrictSearch::new().search(gazetteer, &state, query, limit)?;

    Ok(Response::ok(
        json!({
            "state": state,
            "state_match": outcome,
            "districts": suggestions,
        }),
        None,
    ))
}

pub fn match_address(args: MatchArgs, config: &AppConfig) -> Result<Response> {
    let raw = RawAddress::new(
        args.state.as_deref(),
        args.district.as_deref(),
        args.city.as_deref(),
    );
    let matched = Matcher::new(gazetteer()?)
        .with_similarity_threshold(config.geo.similarity_threshold)
        .match_address(&raw);

    let message = match (&matched.state, &matched.district) {
        (MatchOutcome::NoMatch, _) => Some("No matching state; select the location manually"),
        (_, MatchOutcome::NoMatch) => Some("No matching district; select it manually"),
        _ => None,
    };
    Ok(Response::ok(
        json!({
            "raw": raw,
            "match": matched,
            "complete": matched.is_complete(),
        }),
        message.map(str::to_string),
    ))
}

pub fn resolver(config: &GeoConfig) -> Result<LocationResolver<IpPositionSource>> {
    let source = IpPositionSource::new(
        &config.ip_lookup_url,
        &config.user_agent,
        config.http_timeout(),
    )?;
    Ok(LocationResolver::new(
        GeolocationAcquirer::new(source, config.geolocation_timeout()),
        GeocoderChain::from_config(config)?,
        gazetteer()?,
        config.similarity_threshold,
    ))
}

pub async fn locate(args: LocateArgs, config: &AppConfig) -> Result<Response> {
    let resolver = resolver(&config.geo)?;
    let fix = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => resolver.resolve_at(Coordinates::new(lat, lon)?).await,
        _ => resolver.resolve().await,
    }
    .context("Failed to resolve location")?;

    let resolved = fix.resolved();
    let message = resolved
        .is_none()
        .then(|| bloodbridge_profile::UNMATCHED_LOCATION_MESSAGE.to_string());
    Ok(Response::ok(
        json!({
            "coordinates": fix.coordinates,
            "raw": fix.raw,
            "match": fix.matched,
            "resolved": resolved,
        }),
        message,
    ))
}

pub async fn geocode(args: GeocodeArgs, config: &AppConfig) -> Result<Response> {
    let chain = GeocoderChain::from_config(&config.geo)?;
    let coordinates = chain
        .search(&args.query)
        .await
        .context("Forward geocoding failed")?;
    let message = coordinates
        .is_none()
        .then(|| format!("No coordinates found for '{}'", args.query));
    Ok(Response::ok(
        json!({ "query": args.query, "coordinates": coordinates }),
        message,
    ))
}

/// Check whichever fields were given; location rules run once all three are present.
pub fn validate(args: FieldArgs) -> Result<Response> {
    let mut errors = FieldErrors::new();
    let mut checked = Vec::new();
    let mut record = |field: Field, result: std::result::Result<(), ValidationError>| {
        checked.push(field);
        if let Err(err) = result {
            errors.insert(field, &err);
        }
    };

    if let Some(gender) = &args.gender {
        record(Field::Gender, gender.parse::<Gender>().map(drop));
    }
    if let Some(phone) = &args.phone {
        record(Field::Phone, validate_phone(phone));
    }
    if let Some(dob) = &args.dob {
        record(
            Field::Dob,
            parse_dob(dob).and_then(|dob| validate_dob(dob, today())),
        );
    }
    if let Some(group) = &args.blood_group {
        record(Field::BloodType, group.parse::<BloodGroup>().map(drop));
    }

    if let (Some(state), Some(district), Some(city)) = (&args.state, &args.district, &args.city) {
        let location = validate_location(gazetteer()?, state, district, city);
        checked.extend([Field::State, Field::District, Field::City]);
        errors.extend(location);
    }

    if !errors.is_empty() {
        return Err(ProfileError::Validation(errors).into());
    }
    Ok(Response::ok(
        json!({ "valid": true, "checked": checked }),
        None,
    ))
}

pub async fn profile(config: &AppConfig) -> Result<Response> {
    let client = profile_client(config)?;
    let profile = client
        .fetch_profile()
        .await
        .context("Failed to fetch profile")?;
    Ok(Response::ok(profile, None))
}

fn profile_client(config: &AppConfig) -> Result<ProfileClient> {
    Ok(ProfileClient::new(
        config.api.clone(),
        config.session(),
        &config.geo.user_agent,
    )?)
}

/// Host callbacks for a one-shot CLI run
#[derive(Debug, Default)]
struct CliHost {
    succeeded: bool,
    closed: bool,
}

impl ProfileFormHost for CliHost {
    fn on_success(&mut self) {
        self.succeeded = true;
    }

    fn on_close(&mut self) {
        self.closed = true;
    }
}

pub async fn complete_profile(args: CompleteProfileArgs, config: &AppConfig) -> Result<Response> {
    let mode = if args.update {
        SubmitMode::Update
    } else {
        SubmitMode::Complete
    };
    let mut wizard = ProfileWizard::new(gazetteer()?, mode).with_country(&config.geo.country);
    let autofill = CoordinateAutofill::new(
        Arc::new(GeocoderChain::from_config(&config.geo)?),
        config.geo.debounce(),
    );

    let mut host = CliHost::default();
    if args.interactive {
        let proceed = interactive::run(&mut wizard, autofill, config, args.use_location).await?;
        if !proceed {
            wizard.cancel(&mut host);
            return Ok(Response::ok(
                json!({ "step": wizard.step() }),
                Some("Profile completion cancelled".to_string()),
            ));
        }
    } else {
        fill_personal(&mut wizard, &args.fields)?;
        wizard.next(today())?;
        if args.use_location {
            use_current_location(&mut wizard, config).await?;
        }
        fill_location(&mut wizard, &args.fields)?;
        autofill_coordinates(&mut wizard, autofill, config).await;
    }

    let client = profile_client(config)?;
    let step = wizard.submit(&client, &mut host, today()).await?;
    if step != Step::Done {
        let message = wizard
            .banner()
            .unwrap_or("Profile submission failed")
            .to_string();
        return Ok(Response::failure(
            "submission_failed",
            message,
            json!({ "step": step, "mode": wizard.mode(), "location": wizard.location() }),
        ));
    }

    // The backend owns the profile; show its copy, not ours.
    let profile = if host.succeeded {
        match client.fetch_profile().await {
            Ok(profile) => profile,
            Err(err) => {
                log::warn!("Profile saved but re-fetch failed: {err}");
                Value::Null
            }
        }
    } else {
        Value::Null
    };
    Ok(Response::ok(
        json!({
            "step": step,
            "mode": wizard.mode(),
            "personal": wizard.personal(),
            "location": wizard.location(),
            "profile": profile,
        }),
        Some("Profile updated".to_string()),
    ))
}

fn fill_personal(wizard: &mut ProfileWizard, fields: &FieldArgs) -> Result<()> {
    if let Some(gender) = &fields.gender {
        wizard.set_gender(gender.parse()?)?;
    }
    if let Some(phone) = &fields.phone {
        wizard.set_phone(phone)?;
    }
    if let Some(dob) = &fields.dob {
        wizard.set_dob(parse_dob(dob)?)?;
    }
    if let Some(group) = &fields.blood_group {
        wizard.set_blood_type(group.parse()?)?;
    }
    Ok(())
}

fn fill_location(wizard: &mut ProfileWizard, fields: &FieldArgs) -> Result<()> {
    if let Some(state) = &fields.state {
        wizard.select_state(state)?;
    }
    if let Some(district) = &fields.district {
        wizard.select_district(district)?;
    }
    if let Some(city) = &fields.city {
        wizard.set_city(city)?;
    }
    Ok(())
}

/// "Use my location": failures only set the inline message.
pub async fn use_current_location(wizard: &mut ProfileWizard, config: &AppConfig) -> Result<()> {
    let resolver = resolver(&config.geo)?;
    match resolver.resolve().await {
        Ok(fix) => {
            wizard.apply_location_fix(&fix);
        }
        Err(err) => wizard.apply_location_error(&err),
    }
    if let Some(message) = wizard.location_message() {
        log::warn!("{message}");
    }
    Ok(())
}

/// Feed the settled location query through the debounced autofill and wait
/// for its answer, bounded by the debounce delay plus the HTTP timeout.
pub async fn autofill_coordinates(
    wizard: &mut ProfileWizard,
    mut autofill: CoordinateAutofill,
    config: &AppConfig,
) {
    if wizard.location().latitude.is_some() {
        return;
    }
    let Some(query) = wizard.location_query() else {
        return;
    };

    let mut rx = autofill.subscribe();
    autofill.on_query_changed(Some(query));
    let wait = config.geo.debounce() + config.geo.http_timeout() + Duration::from_secs(1);
    match tokio::time::timeout(wait, rx.changed()).await {
        Ok(Ok(())) => {
            let update: Option<AutofillUpdate> = rx.borrow().clone();
            if let Some(update) = update {
                if !wizard.apply_autofill(&update) {
                    log::info!("No coordinates for '{}'", update.query);
                }
            }
        }
        _ => log::warn!("Coordinate autofill did not answer in time"),
    }
}
