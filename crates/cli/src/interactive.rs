//! Prompt-driven profile completion.
//!
//! Prompts render on stderr, so stdout still carries only the final JSON.

use anyhow::{Context, Result};
use bloodbridge_gazetteer::DistrictSearch;
use bloodbridge_geo::CoordinateAutofill;
use bloodbridge_profile::validation::{parse_dob, validate_dob, validate_phone};
use bloodbridge_profile::{BloodGroup, Gender, ProfileWizard};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

use crate::commands::{autofill_coordinates, use_current_location};
use crate::config::AppConfig;

const DISTRICT_SUGGESTIONS: usize = 8;

/// Walk both steps. Returns false when the user declines to submit.
pub async fn run(
    wizard: &mut ProfileWizard,
    autofill: CoordinateAutofill,
    config: &AppConfig,
    use_location: bool,
) -> Result<bool> {
    let theme = ColorfulTheme::default();
    let today = chrono::Local::now().date_naive();

    personal_details(wizard, &theme, today)?;
    wizard.next(today)?;

    let locate = use_location
        || Confirm::with_theme(&theme)
            .with_prompt("Use my current location?")
            .default(true)
            .interact()?;
    if locate {
        use_current_location(wizard, config).await?;
    }
    if let Some(message) = wizard.location_message() {
        eprintln!("{message}");
    }

    location(wizard, &theme)?;
    autofill_coordinates(wizard, autofill, config).await;

    let location = wizard.location();
    let coordinates = match (location.latitude, location.longitude) {
        (Some(lat), Some(lon)) => format!(" ({lat:.4}, {lon:.4})"),
        _ => String::new(),
    };
    eprintln!(
        "{}, {}, {}{coordinates}",
        location.city, location.district, location.state
    );

    Ok(Confirm::with_theme(&theme)
        .with_prompt("Submit profile?")
        .default(true)
        .interact()?)
}

fn personal_details(
    wizard: &mut ProfileWizard,
    theme: &ColorfulTheme,
    today: chrono::NaiveDate,
) -> Result<()> {
    let genders: Vec<&str> = Gender::ALL.iter().map(|g| g.as_str()).collect();
    let idx = Select::with_theme(theme)
        .with_prompt("Gender")
        .items(&genders)
        .default(0)
        .interact()?;
    wizard.set_gender(Gender::ALL[idx])?;

    let phone: String = Input::with_theme(theme)
        .with_prompt("Phone (10 digits)")
        .validate_with(|input: &String| validate_phone(input).map_err(|e| e.to_string()))
        .interact_text()?;
    wizard.set_phone(&phone)?;

    let dob: String = Input::with_theme(theme)
        .with_prompt("Date of birth (YYYY-MM-DD)")
        .validate_with(|input: &String| {
            parse_dob(input)
                .and_then(|dob| validate_dob(dob, today))
                .map_err(|e| e.to_string())
        })
        .interact_text()?;
    wizard.set_dob(parse_dob(&dob)?)?;

    let groups: Vec<&str> = BloodGroup::ALL.iter().map(|g| g.as_str()).collect();
    let idx = Select::with_theme(theme)
        .with_prompt("Blood group")
        .items(&groups)
        .default(0)
        .interact()?;
    wizard.set_blood_type(BloodGroup::ALL[idx])?;
    Ok(())
}

fn location(wizard: &mut ProfileWizard, theme: &ColorfulTheme) -> Result<()> {
    let gazetteer = bloodbridge_gazetteer::Gazetteer::india().context("Failed to load gazetteer")?;

    let states: Vec<&str> = gazetteer.states().collect();
    let current = states
        .iter()
        .position(|s| *s == wizard.location().state)
        .unwrap_or(0);
    let idx = Select::with_theme(theme)
        .with_prompt("State")
        .items(&states)
        .default(current)
        .interact()?;
    wizard.select_state(states[idx])?;

    if wizard.location().district.is_empty() {
        let query: String = Input::with_theme(theme)
            .with_prompt("District (type to filter, empty for all)")
            .allow_empty(true)
            .interact_text()?;
        let limit = if query.trim().is_empty() {
            usize::MAX
        } else {
            DISTRICT_SUGGESTIONS
        };
        let mut suggestions = DistrictSearch::new().search(
            gazetteer,
            &wizard.location().state,
            &query,
            limit,
        )?;
        if suggestions.is_empty() {
            eprintln!("No district matches '{query}', showing all");
            suggestions = DistrictSearch::new().search(
                gazetteer,
                &wizard.location().state,
                "",
                usize::MAX,
            )?;
        }
        let names: Vec<&str> = suggestions.iter().map(|s| s.district.as_str()).collect();
        let idx = Select::with_theme(theme)
            .with_prompt("District")
            .items(&names)
            .default(0)
            .interact()?;
        wizard.select_district(names[idx])?;
    }

    let city: String = Input::with_theme(theme)
        .with_prompt("City")
        .with_initial_text(wizard.location().city.clone())
        .validate_with(|input: &String| {
            if input.trim().is_empty() {
                Err("City is required")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    wizard.set_city(&city)?;
    Ok(())
}
