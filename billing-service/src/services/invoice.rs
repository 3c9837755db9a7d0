//! Invoice document builder.
//!
//! Composes the full language-specific invoice for a client ledger: one
//! service line, the VAT breakdown, the payment history and the embedded
//! payment slip, plus the rendered HTML handed to the external print/email
//! collaborators. Documents are rebuilt from scratch on every request and
//! contain nothing clock-dependent, so identical inputs render to identical
//! bytes.

use crate::config::OrgConfig;
use crate::models::{
    ClientLedger, InvoiceDocument, InvoiceLanguage, InvoiceLine, PaymentHistoryRow, PaymentRecord,
    PaymentSlip, VatBreakdown,
};
use crate::services::metrics::INVOICES_BUILT_TOTAL;
use crate::services::slip::compute_slip;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use tracing::instrument;

/// Total prices are stored VAT-inclusive at the Swiss standard rate.
static VAT_DIVISOR: Lazy<Decimal> = Lazy::new(|| Decimal::new(1081, 3)); // 1.081
static VAT_RATE_PCT: Lazy<Decimal> = Lazy::new(|| Decimal::new(81, 1)); // 8.1

/// Translated labels for one invoice language.
struct Labels {
    title: &'static str,
    client: &'static str,
    service: &'static str,
    service_date: &'static str,
    net: &'static str,
    vat: &'static str,
    total: &'static str,
    payments: &'static str,
    no_payments: &'static str,
    date: &'static str,
    method: &'static str,
    amount: &'static str,
    paid: &'static str,
    balance: &'static str,
    slip_title: &'static str,
    account: &'static str,
    payable_to: &'static str,
    reference: &'static str,
    debtor: &'static str,
    closing: &'static str,
    method_cash: &'static str,
    method_card: &'static str,
    method_transfer: &'static str,
}

const LABELS_DE: Labels = Labels {
    title: "Rechnung",
    client: "Kunde",
    service: "Leistung",
    service_date: "Leistungsdatum",
    net: "Betrag exkl. MwSt.",
    vat: "MwSt. 8.1%",
    total: "Total inkl. MwSt.",
    payments: "Erhaltene Zahlungen",
    no_payments: "Noch keine Zahlungen erfasst",
    date: "Datum",
    method: "Zahlungsart",
    amount: "Betrag",
    paid: "Bezahlt",
    balance: "Offener Betrag",
    slip_title: "Einzahlungsschein",
    account: "Konto",
    payable_to: "Zahlbar an",
    reference: "Referenz",
    debtor: "Einbezahlt von",
    closing: "Vielen Dank für Ihren Auftrag.",
    method_cash: "Bar",
    method_card: "Karte",
    method_transfer: "Überweisung",
};

const LABELS_FR: Labels = Labels {
    title: "Facture",
    client: "Client",
    service: "Prestation",
    service_date: "Date de la prestation",
    net: "Montant hors TVA",
    vat: "TVA 8.1%",
    total: "Total TVA incluse",
    payments: "Paiements reçus",
    no_payments: "Aucun paiement enregistré",
    date: "Date",
    method: "Mode de paiement",
    amount: "Montant",
    paid: "Payé",
    balance: "Solde dû",
    slip_title: "Bulletin de versement",
    account: "Compte",
    payable_to: "Payable à",
    reference: "Référence",
    debtor: "Versé par",
    closing: "Merci pour votre confiance.",
    method_cash: "Espèces",
    method_card: "Carte",
    method_transfer: "Virement",
};

const LABELS_EN: Labels = Labels {
    title: "Invoice",
    client: "Client",
    service: "Service",
    service_date: "Service date",
    net: "Amount excl. VAT",
    vat: "VAT 8.1%",
    total: "Total incl. VAT",
    payments: "Payments received",
    no_payments: "No payments recorded yet",
    date: "Date",
    method: "Method",
    amount: "Amount",
    paid: "Paid",
    balance: "Balance due",
    slip_title: "Payment slip",
    account: "Account",
    payable_to: "Payable to",
    reference: "Reference",
    debtor: "Paid in by",
    closing: "Thank you for your business.",
    method_cash: "Cash",
    method_card: "Card",
    method_transfer: "Transfer",
};

fn labels(language: InvoiceLanguage) -> &'static Labels {
    match language {
        InvoiceLanguage::De => &LABELS_DE,
        InvoiceLanguage::Fr => &LABELS_FR,
        InvoiceLanguage::En => &LABELS_EN,
    }
}

/// Split a VAT-inclusive total into net and tax, 2 dp for display.
///
/// The division always starts from the full-precision ledger amount; a
/// rebuilt document never round-trips through previously rounded output.
pub fn vat_breakdown(total_price: Decimal) -> VatBreakdown {
    let net_exact = total_price / *VAT_DIVISOR;
    let tax_exact = total_price - net_exact;
    VatBreakdown {
        net: net_exact.round_dp(2),
        tax: tax_exact.round_dp(2),
        total: total_price.round_dp(2),
        rate_pct: *VAT_RATE_PCT,
    }
}

/// Format a CHF amount with exactly two decimal places.
fn chf(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

/// Builds invoice documents for client ledgers.
#[derive(Clone)]
pub struct InvoiceBuilder {
    org: OrgConfig,
}

impl InvoiceBuilder {
    pub fn new(org: OrgConfig) -> Self {
        Self { org }
    }

    #[instrument(skip(self, ledger, payments), fields(client_id = %ledger.client_id, language = language.as_str()))]
    pub fn build(
        &self,
        ledger: &ClientLedger,
        payments: &[PaymentRecord],
        language: InvoiceLanguage,
    ) -> InvoiceDocument {
        let labels = labels(language);

        let vat = vat_breakdown(ledger.total_price);
        let slip = compute_slip(&self.org, ledger);

        let mut sorted: Vec<&PaymentRecord> = payments.iter().collect();
        sorted.sort_by(|a, b| {
            b.created_utc
                .cmp(&a.created_utc)
                .then(b.payment_id.cmp(&a.payment_id))
        });

        let history: Vec<PaymentHistoryRow> = sorted
            .iter()
            .map(|record| PaymentHistoryRow {
                date: record.created_utc.format("%d.%m.%Y").to_string(),
                method: method_label(labels, &record.method).to_string(),
                amount: record.amount,
            })
            .collect();

        // Stable short number derived from the client id, not a counter:
        // documents are ephemeral and must render identically every time.
        let invoice_number = format!(
            "INV-{}",
            ledger.client_id.simple().to_string()[..8].to_uppercase()
        );

        let line = InvoiceLine {
            description: ledger.service_type.clone(),
            amount: ledger.total_price,
        };

        let balance = ledger.total_price - ledger.paid_amount;

        let html = render_html(
            &self.org,
            labels,
            &invoice_number,
            ledger,
            &line,
            &vat,
            &history,
            balance,
            &slip,
        );

        INVOICES_BUILT_TOTAL
            .with_label_values(&[language.as_str()])
            .inc();

        InvoiceDocument {
            invoice_number,
            client_id: ledger.client_id,
            client_name: ledger.name.clone(),
            client_address: ledger.address.clone(),
            language,
            line,
            vat,
            payments: history,
            paid_amount: ledger.paid_amount,
            balance,
            slip,
            html,
        }
    }
}

fn method_label(labels: &Labels, method: &str) -> &'static str {
    match method {
        "cash" => labels.method_cash,
        "card" => labels.method_card,
        _ => labels.method_transfer,
    }
}

#[allow(clippy::too_many_arguments)]
fn render_html(
    org: &OrgConfig,
    labels: &Labels,
    invoice_number: &str,
    ledger: &ClientLedger,
    line: &InvoiceLine,
    vat: &VatBreakdown,
    history: &[PaymentHistoryRow],
    balance: Decimal,
    slip: &PaymentSlip,
) -> String {
    let client_block = match &ledger.address {
        Some(address) => format!("{}<br>{}", ledger.name, address),
        None => ledger.name.clone(),
    };

    let service_date_row = match ledger.service_date {
        Some(date) => format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            labels.service_date,
            date.format("%d.%m.%Y")
        ),
        None => String::new(),
    };

    let payment_rows = if history.is_empty() {
        format!(
            "<tr><td colspan=\"3\">{}</td></tr>\n",
            labels.no_payments
        )
    } else {
        let mut rows = String::new();
        for row in history {
            rows.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td class=\"num\">{}</td></tr>\n",
                row.date,
                row.method,
                chf(row.amount)
            ));
        }
        rows
    };

    format!(
        r###"<html>
<head><meta charset="utf-8"><style>
body {{ font-family: Helvetica, Arial, sans-serif; font-size: 12px; color: #222; }}
table {{ border-collapse: collapse; width: 100%; margin-bottom: 16px; }}
td, th {{ padding: 4px 8px; border-bottom: 1px solid #ddd; text-align: left; }}
.num {{ text-align: right; }}
.slip {{ border: 1px dashed #888; padding: 12px; margin-top: 24px; }}
</style></head>
<body>
<p><strong>{org_name}</strong><br>{org_address}<br>{org_locality}<br>{org_email}</p>
<h1>{title} {invoice_number}</h1>
<p><strong>{client_label}</strong><br>{client_block}</p>
<table>
<tr><td>{service_label}</td><td>{service}</td></tr>
{service_date_row}<tr><td>{amount_label}</td><td class="num">{line_amount}</td></tr>
<tr><td>{net_label}</td><td class="num">{net}</td></tr>
<tr><td>{vat_label}</td><td class="num">{tax}</td></tr>
<tr><td><strong>{total_label}</strong></td><td class="num"><strong>{total}</strong></td></tr>
</table>
<h2>{payments_label}</h2>
<table>
<tr><th>{date_label}</th><th>{method_label}</th><th class="num">{amount_label}</th></tr>
{payment_rows}</table>
<table>
<tr><td>{paid_label}</td><td class="num">{paid}</td></tr>
<tr><td><strong>{balance_label}</strong></td><td class="num"><strong>{balance}</strong></td></tr>
</table>
<div class="slip">
<h2>{slip_title}</h2>
<table>
<tr><td>{account_label}</td><td>{account}</td></tr>
<tr><td>{payable_to_label}</td><td>{payable_to}</td></tr>
<tr><td>{reference_label}</td><td>{reference}</td></tr>
<tr><td>{debtor_label}</td><td>{debtor}</td></tr>
<tr><td>{amount_label}</td><td>{currency} {slip_amount}</td></tr>
</table>
</div>
<p>{closing}</p>
</body>
</html>
"###,
        org_name = org.name,
        org_address = org.address,
        org_locality = org.locality,
        org_email = org.email,
        title = labels.title,
        invoice_number = invoice_number,
        client_label = labels.client,
        client_block = client_block,
        service_label = labels.service,
        service = line.description,
        service_date_row = service_date_row,
        line_amount = chf(line.amount),
        net_label = labels.net,
        net = chf(vat.net),
        vat_label = labels.vat,
        tax = chf(vat.tax),
        total_label = labels.total,
        total = chf(vat.total),
        payments_label = labels.payments,
        date_label = labels.date,
        method_label = labels.method,
        amount_label = labels.amount,
        payment_rows = payment_rows,
        paid_label = labels.paid,
        paid = chf(ledger.paid_amount),
        balance_label = labels.balance,
        balance = chf(balance),
        slip_title = labels.slip_title,
        account_label = labels.account,
        account = slip.account,
        payable_to_label = labels.payable_to,
        payable_to = slip.payable_to,
        reference_label = labels.reference,
        reference = slip.reference,
        debtor_label = labels.debtor,
        debtor = slip.debtor,
        currency = slip.currency,
        slip_amount = chf(slip.amount),
        closing = labels.closing,
    )
}
