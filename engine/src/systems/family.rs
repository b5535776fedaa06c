//! Family System
//!
//! Builds the family graph around an anchor in two independent lines: the
//! parents line (parents, then siblings bounded by the mother) and the partner
//! line (unions, then children bounded by the unions, then any earlier dating
//! history). The assembler can regenerate either line on its own.

use chrono::Datelike;
use rand::Rng;
use tracing::debug;

use crate::components::{Family, FamilyMember, Gender, MaritalStatus, PastRelationship, Union, Vital};
use crate::systems::death::{CHILDBIRTH_CAUSE, CHILDBIRTH_DEATH_CHANCE};
use crate::systems::{children, parents, siblings, unions};
use crate::systems::{Anchor, GenContext};

/// Father, mother and siblings.
pub struct ParentLine {
    pub father: Option<FamilyMember>,
    pub mother: Option<FamilyMember>,
    pub siblings: Vec<FamilyMember>,
}

/// Marital status, unions and the children born into them, plus past
/// relationships for anchors who are not married.
pub struct PartnerLine {
    pub marital_status: MaritalStatus,
    pub unions: Vec<Union>,
    pub children: Vec<FamilyMember>,
    pub relationships: Vec<PastRelationship>,
}

pub fn build_parent_line<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, anchor: &Anchor) -> ParentLine {
    let (father, mut mother) = parents::build_parents(rng, ctx, anchor);
    let siblings = siblings::build_siblings(rng, ctx, anchor, father.as_ref(), mother.as_ref());

    if let Some(mother) = mother.as_mut() {
        let births = std::iter::once(anchor.birth_year()).chain(siblings.iter().map(|s| s.birth_year()));
        childbirth_event(rng, mother, births);
    }

    ParentLine {
        father,
        mother,
        siblings,
    }
}

pub fn build_partner_line<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, anchor: &Anchor) -> PartnerLine {
    let (marital_status, mut unions) = unions::build_unions(rng, ctx, anchor);
    let children = children::build_children(rng, ctx, anchor, &unions);

    // Only a female partner can die in childbirth.
    if anchor.gender == Gender::Male {
        for (idx, union) in unions.iter_mut().enumerate() {
            let union_no = (idx + 1) as u8;
            let births = children
                .iter()
                .filter(|c| c.union == Some(union_no))
                .map(|c| c.birth_year());
            childbirth_event(rng, &mut union.partner, births);
        }
    }

    let relationships = match marital_status {
        MaritalStatus::Single | MaritalStatus::Dating => {
            let before = unions.first().map_or(ctx.today, |u| u.start_date);
            unions::past_relationships(rng, ctx, anchor, before)
        }
        _ => Vec::new(),
    };

    PartnerLine {
        marital_status,
        unions,
        children,
        relationships,
    }
}

pub fn build_family<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, anchor: &Anchor) -> Family {
    let parents = build_parent_line(rng, ctx, anchor);
    let partners = build_partner_line(rng, ctx, anchor);
    assemble(parents, partners)
}

fn assemble(parents: ParentLine, partners: PartnerLine) -> Family {
    Family {
        marital_status: partners.marital_status,
        father: parents.father,
        mother: parents.mother,
        siblings: parents.siblings,
        unions: partners.unions,
        children: partners.children,
        relationships: partners.relationships,
    }
}

/// A mother who died in the year one of her children was born may have died
/// in childbirth.
fn childbirth_event<R, I>(rng: &mut R, mother: &mut FamilyMember, birth_years: I)
where
    R: Rng + ?Sized,
    I: IntoIterator<Item = i32>,
{
    let Vital::Deceased { death_date, cause, .. } = &mut mother.vital else {
        return;
    };
    let death_year = death_date.year();
    if birth_years.into_iter().any(|y| y == death_year) && rng.gen_bool(CHILDBIRTH_DEATH_CHANCE) {
        debug!("{} died in childbirth in {}", mother.name.first, death_year);
        *cause = CHILDBIRTH_CAUSE.to_string();
    }
}
