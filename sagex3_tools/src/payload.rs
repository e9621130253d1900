use chrono::NaiveDate;
use quick_xml::{
    escape::escape,
    events::{BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use sbo_common::Money;

use crate::{config::SageX3Config, error::SageX3Error};

/// The fixed mapping between transaction attributes and Sage X3 field names.
///
/// * header group `SIH0_1`: SALFCY, SIVTYP, INVREF, INVDAT, BPCINV, CUR
/// * payer group `SIH1_1`: BPRNAM, BPAADDLIG, POSCOD, CTY, CRY, EECNUM
/// * one line per item in grid `SIH4_1`: ITMREF, ITMDES, QTY, NETPRI, VATRAT
#[derive(Debug, Clone)]
pub struct InvoicePayload {
    /// Our reference for the invoice (INVREF). Sage rejects a second save with the same reference.
    pub invoice_ref: String,
    pub invoice_date: NaiveDate,
    /// The Sage customer code (BPCINV).
    pub customer_code: String,
    pub currency: String,
    pub payer: PayerDetails,
    pub lines: Vec<InvoiceLine>,
}

#[derive(Debug, Clone, Default)]
pub struct PayerDetails {
    pub name: String,
    pub address_line: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    pub vat_number: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InvoiceLine {
    /// Product (course) identifier, mapped to ITMREF.
    pub product_id: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price: Money,
    /// VAT rate in basis points. 2000 => "20.00" in the VATRAT field.
    pub vat_rate_bps: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapOperation {
    /// Register a new object (invoice creation).
    Save,
    /// Read an existing object back by key (status check).
    Read,
}

impl SoapOperation {
    pub fn name(&self) -> &'static str {
        match self {
            SoapOperation::Save => "save",
            SoapOperation::Read => "read",
        }
    }
}

/// Builds the inner `<PARAM>` document for an invoice registration.
pub fn build_input_xml(payload: &InvoicePayload, config: &SageX3Config) -> Result<String, SageX3Error> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Start(BytesStart::new("PARAM")))?;

    write_group(&mut writer, "SIH0_1", &[
        ("SALFCY", config.sales_site.as_str()),
        ("SIVTYP", config.invoice_type.as_str()),
        ("INVREF", payload.invoice_ref.as_str()),
        ("INVDAT", &payload.invoice_date.format("%Y%m%d").to_string()),
        ("BPCINV", payload.customer_code.as_str()),
        ("CUR", payload.currency.as_str()),
    ])?;

    let payer = &payload.payer;
    write_group(&mut writer, "SIH1_1", &[
        ("BPRNAM", payer.name.as_str()),
        ("BPAADDLIG", payer.address_line.as_str()),
        ("POSCOD", payer.postal_code.as_str()),
        ("CTY", payer.city.as_str()),
        ("CRY", payer.country.as_str()),
        ("EECNUM", payer.vat_number.as_deref().unwrap_or("")),
    ])?;

    let mut tab = BytesStart::new("TAB");
    tab.push_attribute(("ID", "SIH4_1"));
    writer.write_event(Event::Start(tab))?;
    for (n, line) in payload.lines.iter().enumerate() {
        let mut lin = BytesStart::new("LIN");
        lin.push_attribute(("NUM", (n + 1).to_string().as_str()));
        writer.write_event(Event::Start(lin))?;
        write_fld(&mut writer, "ITMREF", &line.product_id)?;
        write_fld(&mut writer, "ITMDES", &line.description)?;
        write_fld(&mut writer, "QTY", &line.quantity.to_string())?;
        write_fld(&mut writer, "NETPRI", &line.unit_price.to_decimal_string())?;
        write_fld(&mut writer, "VATRAT", &format_rate(line.vat_rate_bps))?;
        writer.write_event(Event::End(BytesEnd::new("LIN")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("TAB")))?;

    writer.write_event(Event::End(BytesEnd::new("PARAM")))?;
    into_string(writer)
}

/// Builds the inner key document used by `read` calls to look an invoice up by our reference.
pub fn build_key_xml(invoice_ref: &str) -> Result<String, SageX3Error> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Start(BytesStart::new("PARAM")))?;
    write_group(&mut writer, "SIH0_1", &[("INVREF", invoice_ref)])?;
    writer.write_event(Event::End(BytesEnd::new("PARAM")))?;
    into_string(writer)
}

/// Wraps an inner document in the `CAdxWebServiceXmlCC` SOAP 1.1 envelope. The inner XML travels as escaped text in
/// the `inputXml` parameter.
pub fn soap_envelope(op: SoapOperation, config: &SageX3Config, inner_xml: &str) -> String {
    let op = op.name();
    let lang = escape(config.language.as_str());
    let pool = escape(config.pool_alias.as_str());
    let public_name = escape(config.public_name.as_str());
    let input = escape(inner_xml);
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:wss="http://www.adonix.com/WSS">
  <soapenv:Header/>
  <soapenv:Body>
    <wss:{op} soapenv:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
      <callContext xsi:type="wss:CAdxCallContext">
        <codeLang xsi:type="xsd:string">{lang}</codeLang>
        <poolAlias xsi:type="xsd:string">{pool}</poolAlias>
        <poolId xsi:type="xsd:string"></poolId>
        <requestConfig xsi:type="xsd:string">adxwss.optreturn=XML</requestConfig>
      </callContext>
      <publicName xsi:type="xsd:string">{public_name}</publicName>
      <inputXml xsi:type="xsd:string">{input}</inputXml>
    </wss:{op}>
  </soapenv:Body>
</soapenv:Envelope>"#
    )
}

fn write_group(writer: &mut Writer<Vec<u8>>, id: &str, fields: &[(&str, &str)]) -> Result<(), SageX3Error> {
    let mut grp = BytesStart::new("GRP");
    grp.push_attribute(("ID", id));
    writer.write_event(Event::Start(grp))?;
    for (name, value) in fields {
        write_fld(writer, name, value)?;
    }
    writer.write_event(Event::End(BytesEnd::new("GRP")))?;
    Ok(())
}

fn write_fld(writer: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<(), SageX3Error> {
    let mut fld = BytesStart::new("FLD");
    fld.push_attribute(("NAME", name));
    writer.write_event(Event::Start(fld))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new("FLD")))?;
    Ok(())
}

fn into_string(writer: Writer<Vec<u8>>) -> Result<String, SageX3Error> {
    String::from_utf8(writer.into_inner()).map_err(|e| SageX3Error::RequestError(e.to_string()))
}

fn format_rate(bps: i64) -> String {
    format!("{}.{:02}", bps / 100, bps % 100)
}
