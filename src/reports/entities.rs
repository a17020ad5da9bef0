//! Premise, meter and gateway listings.

use async_trait::async_trait;

use super::{ColumnType, Report, ReportBuilder, ReportContext};
use crate::error::Result;
use crate::models::{EntityListQuery, Gateway, Meter, Premise};
use crate::output::{local_time, text};
use crate::pagination::ErrorPolicy;
use crate::traits::List;

#[derive(Debug, Clone, Default)]
pub struct PremiseListReport {
    pub query: EntityListQuery,
}

#[async_trait]
impl ReportBuilder for PremiseListReport {
    fn name(&self) -> &'static str {
        "premise list"
    }

    async fn build(&self, ctx: &ReportContext<'_>) -> Result<Report> {
        use ColumnType::Text;

        let premises =
            Premise::list_all_with(ctx.client, &self.query, ctx.page_limit, ErrorPolicy::Abort).await?;

        let mut report = Report::new(
            "Premises",
            &[
                ("ID", Text),
                ("Name", Text),
                ("Address", Text),
                ("City", Text),
                ("Postal Code", Text),
                ("Created", Text),
            ],
        );
        for premise in premises {
            report.push(vec![
                premise.id,
                text(premise.name.as_deref()),
                text(premise.street_address.as_deref()),
                text(premise.city_town.as_deref()),
                text(premise.postal_code.as_deref()),
                premise.created_at.map(local_time).unwrap_or_default(),
            ]);
        }
        Ok(report)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MeterListReport {
    pub query: EntityListQuery,
}

#[async_trait]
impl ReportBuilder for MeterListReport {
    fn name(&self) -> &'static str {
        "meter list"
    }

    async fn build(&self, ctx: &ReportContext<'_>) -> Result<Report> {
        use ColumnType::Text;

        let meters =
            Meter::list_all_with(ctx.client, &self.query, ctx.page_limit, ErrorPolicy::Abort).await?;

        let mut report = Report::new(
            "Meters",
            &[("ID", Text), ("Type", Text), ("Premise", Text), ("Created", Text)],
        );
        for meter in meters {
            report.push(vec![
                meter.id,
                text(meter.meter_type.as_deref()),
                text(meter.premise_id.as_deref()),
                meter.created_at.map(local_time).unwrap_or_default(),
            ]);
        }
        Ok(report)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GatewayListReport {
    pub query: EntityListQuery,
}

#[async_trait]
impl ReportBuilder for GatewayListReport {
    fn name(&self) -> &'static str {
        "gateway list"
    }

    async fn build(&self, ctx: &ReportContext<'_>) -> Result<Report> {
        use ColumnType::Text;

        let gateways =
            Gateway::list_all_with(ctx.client, &self.query, ctx.page_limit, ErrorPolicy::Abort).await?;

        let mut report = Report::new(
            "Gateways",
            &[
                ("ID", Text),
                ("Premise", Text),
                ("State", Text),
                ("Firmware", Text),
                ("Last Heard", Text),
            ],
        );
        for gateway in gateways {
            report.push(vec![
                gateway.id,
                text(gateway.premise_id.as_deref()),
                text(gateway.state.as_deref()),
                text(gateway.firmware_version.as_deref()),
                gateway.last_heard.map(local_time).unwrap_or_default(),
            ]);
        }
        Ok(report)
    }
}
