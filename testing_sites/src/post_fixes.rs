//! Named corrections for known quirks of the page, run over every parsed site.
//! Each one reports whether the quirk it targets was found.

use anyhow::{bail, Context};
use chrono::NaiveDate;
use schedule_parser::{Day, OpeningHours, ParseErrorKind};
use tracing::info;

use crate::listing::{Borough, PageContext, SiteType};
use crate::site::{Offer, ParsedSite};

pub type PostFixer = fn(&mut [ParsedSite], &PageContext) -> anyhow::Result<bool>;

pub const POST_FIXERS: [(&str, PostFixer); 9] = [
    ("coney_island_fixes", coney_island_fixes),
    ("bellevue_walkin", bellevue_walkin),
    ("add_rapid_pcr_to_mobile", add_rapid_pcr_to_mobile),
    ("add_saliva_pcr_to_micro", add_saliva_pcr_to_micro),
    ("add_pcr_to_mortar", add_pcr_to_mortar),
    ("fix_woodside_name", fix_woodside_name),
    ("bellevue_christmas_message", bellevue_christmas_message),
    ("elmhurst_appts_required", elmhurst_appts_required),
    ("belvis_nye_christmas_eve", belvis_nye_christmas_eve),
];

pub fn run_post_fixes(sites: &mut [ParsedSite], page: &PageContext) -> anyhow::Result<()> {
    info!("Running post-fixes...");
    for (name, fixer) in POST_FIXERS {
        let applied = fixer(sites, page).with_context(|| format!("post-fix {name} failed"))?;
        let visual = if applied { "✅" } else { "❌" };
        info!("{visual} {name}");
    }
    Ok(())
}

fn find_site<'a>(sites: &'a mut [ParsedSite], name: &str) -> Option<&'a mut ParsedSite> {
    sites.iter_mut().find(|site| site.name == name)
}

/// Drops the `could-not-parse` error for `value`, if there was one.
fn take_unparsed(site: &mut ParsedSite, value: &str) -> bool {
    let before = site.schedule.errors.len();
    site.schedule
        .errors
        .retain(|error| !(error.kind == ParseErrorKind::CouldNotParse && error.value == value));
    site.schedule.errors.len() != before
}

fn add_offers_by_header(
    sites: &mut [ParsedSite],
    page: &PageContext,
    site_type: SiteType,
    header_text: &str,
    offers: &[Offer],
) -> bool {
    let mut found = false;
    for borough in Borough::ALL {
        let mentions_offer = page
            .section_header(borough, site_type)
            .map_or(false, |header| header.contains(header_text));
        if !mentions_offer {
            continue;
        }
        found = true;
        sites
            .iter_mut()
            .filter(|site| site.borough == borough && site.site_type == site_type)
            .for_each(|site| site.offers.extend_from_slice(offers));
    }
    found
}

pub fn coney_island_fixes(sites: &mut [ParsedSite], _page: &PageContext) -> anyhow::Result<bool> {
    const NOTES: [&str; 2] = [
        "Limited walk ins availability",
        "No walk-ins after 5 pm Mon – Fri and no walk-ins after 2pm on Saturdays",
    ];

    let Some(coney) = find_site(sites, "NYC Health + Hospitals/Coney Island") else {
        return Ok(false);
    };

    coney
        .schedule
        .errors
        .retain(|error| error.kind != ParseErrorKind::HoursAlreadyExist);
    if take_unparsed(coney, "Please schedule an appointment") {
        coney.appointments_required = true;
    }
    for note in NOTES {
        if take_unparsed(coney, note) {
            coney.notes.push(note.to_string());
        }
    }
    Ok(take_unparsed(
        coney,
        "*Coney Island Hospital does not offer rapid testing.",
    ))
}

pub fn bellevue_walkin(sites: &mut [ParsedSite], _page: &PageContext) -> anyhow::Result<bool> {
    let Some(bellevue) = find_site(sites, "NYC Health + Hospitals/Bellevue") else {
        return Ok(false);
    };
    Ok(take_unparsed(
        bellevue,
        "*Walk-in hours maybe subject to change depending on patient volume.",
    ))
}

pub fn add_rapid_pcr_to_mobile(
    sites: &mut [ParsedSite],
    page: &PageContext,
) -> anyhow::Result<bool> {
    Ok(add_offers_by_header(
        sites,
        page,
        SiteType::Mobile,
        "Rapid and PCR available",
        &[Offer::Rapid, Offer::Pcr],
    ))
}

pub fn add_saliva_pcr_to_micro(
    sites: &mut [ParsedSite],
    page: &PageContext,
) -> anyhow::Result<bool> {
    Ok(add_offers_by_header(
        sites,
        page,
        SiteType::Micro,
        "Saliva-based PCR",
        &[Offer::SalivaPcr],
    ))
}

pub fn add_pcr_to_mortar(sites: &mut [ParsedSite], _page: &PageContext) -> anyhow::Result<bool> {
    let mut found = false;
    for site in sites
        .iter_mut()
        .filter(|site| site.site_type == SiteType::Mortar && !site.offers.contains(&Offer::Pcr))
    {
        site.offers.push(Offer::Pcr);
        found = true;
    }
    Ok(found)
}

pub fn fix_woodside_name(sites: &mut [ParsedSite], _page: &PageContext) -> anyhow::Result<bool> {
    let Some(woodside) = find_site(sites, "NYCHA Woodside Streetside Parking at") else {
        return Ok(false);
    };
    woodside.name = "NYCHA Woodside Streetside Parking".to_string();
    Ok(true)
}

pub fn bellevue_christmas_message(
    sites: &mut [ParsedSite],
    _page: &PageContext,
) -> anyhow::Result<bool> {
    let Some(bellevue) = find_site(sites, "NYC Health + Hospitals/Bellevue") else {
        return Ok(false);
    };
    let found = take_unparsed(
        bellevue,
        "Bellevue Testing will be closing at noon on Friday 12/24 and we will be CLOSED on Christmas Day 12/25",
    );
    if found {
        let christmas = NaiveDate::from_ymd_opt(2021, 12, 25).context("Invalid Christmas date")?;
        bellevue.closed = vec![christmas];
    }
    Ok(found)
}

pub fn elmhurst_appts_required(
    sites: &mut [ParsedSite],
    _page: &PageContext,
) -> anyhow::Result<bool> {
    let Some(elmhurst) = find_site(sites, "NYC Health + Hospitals/Elmhurst") else {
        return Ok(false);
    };
    let found = take_unparsed(
        elmhurst,
        "Appointments are REQUIRED.  NO walk-ins at this time.",
    );
    if found {
        elmhurst.appointments_required = true;
    }
    Ok(found)
}

/// Belvis closes at 1 p.m. on both holiday eves, which fall on Fridays.
pub fn belvis_nye_christmas_eve(
    sites: &mut [ParsedSite],
    _page: &PageContext,
) -> anyhow::Result<bool> {
    let Some(belvis) = find_site(sites, "NYC Health + Hospitals/Gotham Health, Belvis") else {
        return Ok(false);
    };
    if !take_unparsed(
        belvis,
        "Closed at 1:00 PM for Christmas Eve and New Year Eve",
    ) {
        return Ok(false);
    }

    let Some(friday) = belvis.schedule.hours.get(&Day::Friday).copied() else {
        bail!("Could not get Friday hours");
    };
    for (month, day) in [(12, 24), (12, 31)] {
        let date = NaiveDate::from_ymd_opt(2021, month, day).context("Invalid holiday eve date")?;
        belvis
            .schedule
            .date_specific_hours
            .insert(date, OpeningHours(friday.open(), 1300));
    }
    Ok(true)
}
